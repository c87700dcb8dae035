//! ESP32-SK advertisement protocol - payload layout, decoding and AD framing
//!
//! The firmware broadcasts a 10 byte manufacturer-specific payload; hosts key
//! it by company identifier and hand the bare payload to the decoders in
//! [`payload`]. [`adv`] covers the advertising-data framing around it.

pub mod adv;
pub mod payload;

pub use adv::{
    AdStructure, DEFAULT_COMPANY_ID, DEVICE_NAME, MAX_ADV_LEN, build_advertisement,
    find_manufacturer_data, local_name,
    manufacturer_specific, parse_advertisement, split_company_id,
};
pub use payload::{
    PAYLOAD_LEN, PAYLOAD_VERSION, Payload, Reading, decode_humidity_ratio, decode_pressure_pa,
    decode_temperature_k,
};
