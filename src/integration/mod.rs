pub mod franklinwh;
pub mod homeassistant;
