use cyclobind::engine::bridge::BridgeCommand;
use cyclobind::engine::config::DesignConfig;

pub struct AppConfig {
    pub core_config: DesignConfig,
    pub engine: BridgeCommand,
}
