//! BLE advertising data framing for the ESP32-SK broadcaster
//!
//! An advertisement is a sequence of AD structures, each `[len][type][data..]`
//! where `len` counts the type byte plus data. The sensor payload travels in a
//! manufacturer-specific structure, prefixed with a little-endian company id.

use std::io;

/// Company identifier the firmware advertises with (Bluetooth SIG test id)
pub const DEFAULT_COMPANY_ID: u16 = 0xFFFF;

/// Local name the firmware advertises with
pub const DEVICE_NAME: &str = "ESP32-SK";

/// Legacy advertising payload limit
pub const MAX_ADV_LEN: usize = 31;

// AD types
pub const AD_TYPE_FLAGS: u8 = 0x01;
pub const AD_TYPE_COMPLETE_NAME: u8 = 0x09;
pub const AD_TYPE_MANUFACTURER: u8 = 0xFF;

/// LE general discoverable, BR/EDR not supported
pub const ADV_FLAGS: u8 = 0x06;

/// One AD structure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdStructure {
    pub ad_type: u8,
    pub data: Vec<u8>,
}

impl AdStructure {
    pub fn new(ad_type: u8, data: Vec<u8>) -> Self {
        Self { ad_type, data }
    }

    fn write_to(&self, buf: &mut Vec<u8>) -> io::Result<()> {
        let len = u8::try_from(self.data.len() + 1)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "AD structure too long"))?;
        buf.push(len);
        buf.push(self.ad_type);
        buf.extend_from_slice(&self.data);
        Ok(())
    }
}

/// Manufacturer-specific data: company id followed by the payload
pub fn manufacturer_specific(company_id: u16, payload: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(2 + payload.len());
    buf.extend_from_slice(&company_id.to_le_bytes());
    buf.extend_from_slice(payload);
    buf
}

/// Split manufacturer-specific data into company id and payload
pub fn split_company_id(data: &[u8]) -> io::Result<(u16, &[u8])> {
    if data.len() < 2 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "manufacturer data too short for company id",
        ));
    }
    Ok((u16::from_le_bytes([data[0], data[1]]), &data[2..]))
}

/// Full advertisement: flags, complete local name, manufacturer data
pub fn build_advertisement(name: &str, company_id: u16, payload: &[u8]) -> io::Result<Vec<u8>> {
    let structures = [
        AdStructure::new(AD_TYPE_FLAGS, vec![ADV_FLAGS]),
        AdStructure::new(AD_TYPE_COMPLETE_NAME, name.as_bytes().to_vec()),
        AdStructure::new(AD_TYPE_MANUFACTURER, manufacturer_specific(company_id, payload)),
    ];

    let mut buf = Vec::with_capacity(MAX_ADV_LEN);
    for s in &structures {
        s.write_to(&mut buf)?;
    }

    if buf.len() > MAX_ADV_LEN {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("advertisement is {} bytes, limit is {MAX_ADV_LEN}", buf.len()),
        ));
    }
    Ok(buf)
}

/// Parse raw advertising data into AD structures
///
/// A zero length byte ends the significant part (the rest is padding).
pub fn parse_advertisement(data: &[u8]) -> io::Result<Vec<AdStructure>> {
    let mut structures = Vec::new();
    let mut pos = 0;

    while pos < data.len() {
        let len = data[pos] as usize;
        if len == 0 {
            break;
        }
        if data.len() < pos + 1 + len {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "AD structure truncated"));
        }
        let ad_type = data[pos + 1];
        let body = data[pos + 2..pos + 1 + len].to_vec();
        structures.push(AdStructure { ad_type, data: body });
        pos += 1 + len;
    }

    Ok(structures)
}

/// Payload of the first manufacturer-specific structure for `company_id`
pub fn find_manufacturer_data(structures: &[AdStructure], company_id: u16) -> Option<&[u8]> {
    structures
        .iter()
        .filter(|s| s.ad_type == AD_TYPE_MANUFACTURER)
        .filter_map(|s| split_company_id(&s.data).ok())
        .find(|(id, _)| *id == company_id)
        .map(|(_, payload)| payload)
}

/// Local name carried by the advertisement, if any
pub fn local_name(structures: &[AdStructure]) -> Option<String> {
    structures
        .iter()
        .find(|s| s.ad_type == AD_TYPE_COMPLETE_NAME)
        .map(|s| String::from_utf8_lossy(&s.data).into_owned())
}
