pub mod design;
pub mod offset;
pub mod params;
