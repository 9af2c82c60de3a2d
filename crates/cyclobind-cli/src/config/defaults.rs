pub struct DefaultsConfig {
    pub chain: String,
    pub binder_len: usize,
    pub cyclic: bool,
    pub use_multimer: bool,
    pub num_recycles: u32,
    pub num_models: usize,
    pub learning_rate: f64,
    pub norm_seq_grad: bool,
    pub dropout: bool,
    pub trials: usize,
    pub output_pattern: String,
    pub engine_command: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            chain: "A".to_string(),
            binder_len: 13,
            cyclic: true,
            use_multimer: true,
            num_recycles: 6,
            num_models: 1,
            learning_rate: 0.1,
            norm_seq_grad: true,
            dropout: true,
            trials: 10,
            output_pattern: "mcmc_{n}.pdb".to_string(),
            engine_command: "cyclobind-bridge".to_string(),
        }
    }
}
