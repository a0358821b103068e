mod zone;

pub use zone::ZoneServices;
