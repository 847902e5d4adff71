//! Building blocks shared by commands and events.

use std::fmt;

use fsci_frame::{WireError, WireReader, WireResult, WireWriter};
use serde::{Serialize, Serializer};

use crate::marshal::Marshal;

/// Host-assigned connection identifier.
pub type DeviceId = u8;

/// Status code returned by the BLE host API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct BleStatus(pub u16);

impl BleStatus {
    pub const SUCCESS: Self = Self(0x0000);
    pub const INVALID_PARAMETER: Self = Self(0x0001);
    pub const OVERFLOW: Self = Self(0x0002);
    pub const UNAVAILABLE: Self = Self(0x0003);
    pub const FEATURE_NOT_SUPPORTED: Self = Self(0x0004);
    pub const OUT_OF_MEMORY: Self = Self(0x0005);
    pub const ALREADY_INITIALIZED: Self = Self(0x0006);
    pub const OS_ERROR: Self = Self(0x0007);
    pub const UNEXPECTED_ERROR: Self = Self(0x0008);
    pub const INVALID_STATE: Self = Self(0x0009);

    pub fn is_success(self) -> bool {
        self == Self::SUCCESS
    }
}

impl fmt::Display for BleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match *self {
            Self::SUCCESS => "success",
            Self::INVALID_PARAMETER => "invalid parameter",
            Self::OVERFLOW => "overflow",
            Self::UNAVAILABLE => "unavailable",
            Self::FEATURE_NOT_SUPPORTED => "feature not supported",
            Self::OUT_OF_MEMORY => "out of memory",
            Self::ALREADY_INITIALIZED => "already initialized",
            Self::OS_ERROR => "os error",
            Self::UNEXPECTED_ERROR => "unexpected error",
            Self::INVALID_STATE => "invalid state",
            _ => return write!(f, "status 0x{:04X}", self.0),
        };
        f.write_str(name)
    }
}

impl Marshal for BleStatus {
    fn wire_size(&self) -> usize {
        2
    }

    fn encode(&self, w: &mut WireWriter) -> WireResult<()> {
        w.put_u16(self.0)
    }

    fn decode(r: &mut WireReader<'_>) -> WireResult<Self> {
        Self::decode_field(r, "status")
    }

    fn decode_field(r: &mut WireReader<'_>, field: &'static str) -> WireResult<Self> {
        r.u16(field).map(Self)
    }
}

/// A 48-bit Bluetooth device address, least significant byte first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DeviceAddress(pub [u8; 6]);

impl fmt::Display for DeviceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{g:02X}:{e:02X}:{d:02X}:{c:02X}:{b:02X}:{a:02X}")
    }
}

impl Serialize for DeviceAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl Marshal for DeviceAddress {
    fn wire_size(&self) -> usize {
        6
    }

    fn encode(&self, w: &mut WireWriter) -> WireResult<()> {
        w.put_slice(&self.0)
    }

    fn decode(r: &mut WireReader<'_>) -> WireResult<Self> {
        Self::decode_field(r, "address")
    }

    fn decode_field(r: &mut WireReader<'_>, field: &'static str) -> WireResult<Self> {
        r.array(field).map(Self)
    }
}

wire_enum! {
    pub enum AddressType {
        Public = 0x00,
        Random = 0x01,
        PublicIdentity = 0x02,
        RandomIdentity = 0x03,
    }
}

wire_enum! {
    pub enum IoCapabilities {
        DisplayOnly = 0x00,
        DisplayYesNo = 0x01,
        KeyboardOnly = 0x02,
        NoInputNoOutput = 0x03,
        KeyboardDisplay = 0x04,
    }
}

wire_enum! {
    pub enum Role {
        Central = 0x00,
        Peripheral = 0x01,
    }
}

record! {
    /// An address together with its type.
    pub struct IdentityAddress {
        pub address_type: AddressType,
        pub address: DeviceAddress,
    }
}

record! {
    /// A payload with no fields.
    pub struct Empty {}
}

record! {
    pub struct DeviceRef {
        pub device_id: DeviceId,
    }
}

record! {
    pub struct StatusEvent {
        pub status: BleStatus,
    }
}

record! {
    pub struct AdvHandle {
        pub handle: u8,
    }
}

record! {
    pub struct ConnectionParameters {
        pub conn_interval: u16,
        pub conn_latency: u16,
        pub supervision_timeout: u16,
        pub central_clock_accuracy: u8,
    }
}

record! {
    pub struct AdvertisingParameters {
        pub min_interval: u16,
        pub max_interval: u16,
        pub advertising_type: u8,
        pub own_address_type: AddressType,
        pub peer_address_type: AddressType,
        pub peer_address: DeviceAddress,
        pub channel_map: u8,
        pub filter_policy: u8,
    }
}

record! {
    pub struct ScanningParameters {
        pub scan_type: u8,
        pub interval: u16,
        pub window: u16,
        pub own_address_type: AddressType,
        pub filter_policy: u8,
        pub scanning_phys: u8,
    }
}

record! {
    pub struct ConnectionRequestParameters {
        pub scan_interval: u16,
        pub scan_window: u16,
        pub filter_policy: u8,
        pub own_address_type: AddressType,
        pub peer_address_type: AddressType,
        pub peer_address: DeviceAddress,
        pub conn_interval_min: u16,
        pub conn_interval_max: u16,
        pub conn_latency: u16,
        pub supervision_timeout: u16,
        pub conn_event_length_min: u16,
        pub conn_event_length_max: u16,
        pub initiating_phys: u8,
    }
}

record! {
    pub struct PairingParameters {
        pub with_bonding: bool,
        pub security_mode_and_level: u8,
        pub max_encryption_key_size: u8,
        pub local_io_capabilities: IoCapabilities,
        pub oob_available: bool,
        pub central_keys: u8,
        pub peripheral_keys: u8,
        pub lesc_only: bool,
        pub use_keypress_notifications: bool,
    }
}

record! {
    /// Pairing parameters addressed to one connection.
    pub struct DevicePairing {
        pub device_id: DeviceId,
        pub parameters: PairingParameters,
    }
}

/// One AD structure: a length byte covering type and data, the AD type,
/// then the data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdStructure {
    pub ad_type: u8,
    pub data: Vec<u8>,
}

impl Marshal for AdStructure {
    fn wire_size(&self) -> usize {
        2 + self.data.len()
    }

    fn encode(&self, w: &mut WireWriter) -> WireResult<()> {
        w.put_len_u8("ad_length", self.data.len() + 1)?;
        w.put_u8(self.ad_type)?;
        w.put_slice(&self.data)
    }

    fn decode(r: &mut WireReader<'_>) -> WireResult<Self> {
        let len = r.u8("ad_length")?;
        if len == 0 {
            return Err(WireError::InvalidValue {
                field: "ad_length",
                value: 0,
            });
        }
        let ad_type = r.u8("ad_type")?;
        let data = r.bytes("ad_data", usize::from(len) - 1)?;
        Ok(Self { ad_type, data })
    }
}

/// A counted list of AD structures.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct AdvertisingData {
    pub structures: Vec<AdStructure>,
}

impl Marshal for AdvertisingData {
    fn wire_size(&self) -> usize {
        1 + self
            .structures
            .iter()
            .map(Marshal::wire_size)
            .sum::<usize>()
    }

    fn encode(&self, w: &mut WireWriter) -> WireResult<()> {
        w.put_len_u8("num_ad_structures", self.structures.len())?;
        for ad in &self.structures {
            ad.encode(w)?;
        }
        Ok(())
    }

    fn decode(r: &mut WireReader<'_>) -> WireResult<Self> {
        let count = usize::from(r.u8("num_ad_structures")?);
        let mut structures = r.alloc_vec("ad_structures", count)?;
        for _ in 0..count {
            structures.push(AdStructure::decode(r)?);
        }
        Ok(Self { structures })
    }
}

/// A long term key block as carried inside [`SmpKeys`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LtkInfo {
    pub ltk: Vec<u8>,
    pub rand: Vec<u8>,
    pub ediv: u16,
}

impl Marshal for LtkInfo {
    fn wire_size(&self) -> usize {
        1 + self.ltk.len() + 1 + self.rand.len() + 2
    }

    fn encode(&self, w: &mut WireWriter) -> WireResult<()> {
        w.put_bytes_u8("ltk_size", &self.ltk)?;
        w.put_bytes_u8("rand_size", &self.rand)?;
        w.put_u16(self.ediv)
    }

    fn decode(r: &mut WireReader<'_>) -> WireResult<Self> {
        let ltk = r.bytes_u8("ltk")?;
        let rand = r.bytes_u8("rand")?;
        let ediv = r.u16("ediv")?;
        Ok(Self { ltk, rand, ediv })
    }
}

record! {
    /// Keys distributed during pairing. Each block is optional.
    pub struct SmpKeys {
        pub ltk: Option<LtkInfo>,
        pub irk: Option<[u8; 16]>,
        pub csrk: Option<[u8; 16]>,
        pub address: Option<IdentityAddress>,
    }
}

/// The `(device, tx, rx)` triple carried by PHY reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PhyLink {
    pub device_id: DeviceId,
    pub tx_phy: u8,
    pub rx_phy: u8,
}

/// PHY report; the link fields are absent for `SetDefaultComplete`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PhyEvent {
    SetDefaultComplete,
    Read(PhyLink),
    UpdateComplete(PhyLink),
}

impl PhyEvent {
    const SET_DEFAULT_COMPLETE: u8 = 0x00;
    const READ: u8 = 0x01;
    const UPDATE_COMPLETE: u8 = 0x02;

    pub fn link(&self) -> Option<&PhyLink> {
        match self {
            Self::SetDefaultComplete => None,
            Self::Read(link) | Self::UpdateComplete(link) => Some(link),
        }
    }
}

impl Marshal for PhyEvent {
    fn wire_size(&self) -> usize {
        1 + self.link().map_or(0, |_| 3)
    }

    fn encode(&self, w: &mut WireWriter) -> WireResult<()> {
        let kind = match self {
            Self::SetDefaultComplete => Self::SET_DEFAULT_COMPLETE,
            Self::Read(_) => Self::READ,
            Self::UpdateComplete(_) => Self::UPDATE_COMPLETE,
        };
        w.put_u8(kind)?;
        if let Some(link) = self.link() {
            w.put_u8(link.device_id)?;
            w.put_u8(link.tx_phy)?;
            w.put_u8(link.rx_phy)?;
        }
        Ok(())
    }

    fn decode(r: &mut WireReader<'_>) -> WireResult<Self> {
        let kind = r.u8("phy_event_type")?;
        if kind == Self::SET_DEFAULT_COMPLETE {
            return Ok(Self::SetDefaultComplete);
        }
        let link = PhyLink {
            device_id: r.u8("device_id")?,
            tx_phy: r.u8("tx_phy")?,
            rx_phy: r.u8("rx_phy")?,
        };
        match kind {
            Self::READ => Ok(Self::Read(link)),
            Self::UPDATE_COMPLETE => Ok(Self::UpdateComplete(link)),
            other => Err(WireError::InvalidValue {
                field: "phy_event_type",
                value: u32::from(other),
            }),
        }
    }
}

/// Result of a pairing attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum PairingOutcome {
    Success { with_bonding: bool },
    Failed { reason: BleStatus },
}

impl Marshal for PairingOutcome {
    fn wire_size(&self) -> usize {
        match self {
            Self::Success { .. } => 2,
            Self::Failed { .. } => 3,
        }
    }

    fn encode(&self, w: &mut WireWriter) -> WireResult<()> {
        match self {
            Self::Success { with_bonding } => {
                w.put_bool(true)?;
                w.put_bool(*with_bonding)
            }
            Self::Failed { reason } => {
                w.put_bool(false)?;
                reason.encode(w)
            }
        }
    }

    fn decode(r: &mut WireReader<'_>) -> WireResult<Self> {
        if r.bool("pairing_successful")? {
            Ok(Self::Success {
                with_bonding: r.bool("with_bonding")?,
            })
        } else {
            Ok(Self::Failed {
                reason: BleStatus::decode_field(r, "fail_reason")?,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marshal::encode_exact;

    fn roundtrip<T: Marshal + PartialEq + fmt::Debug>(value: &T) -> Vec<u8> {
        let bytes = encode_exact(value).unwrap();
        let mut r = WireReader::new(&bytes);
        assert_eq!(&T::decode(&mut r).unwrap(), value);
        assert!(r.is_empty());
        bytes.to_vec()
    }

    #[test]
    fn address_displays_most_significant_byte_first() {
        let addr = DeviceAddress([0x01, 0x02, 0x03, 0x04, 0x05, 0xC0]);
        assert_eq!(addr.to_string(), "C0:05:04:03:02:01");
        assert_eq!(
            serde_json::to_string(&addr).unwrap(),
            "\"C0:05:04:03:02:01\""
        );
    }

    #[test]
    fn status_display() {
        assert_eq!(BleStatus::OUT_OF_MEMORY.to_string(), "out of memory");
        assert_eq!(BleStatus(0x0A01).to_string(), "status 0x0A01");
        assert!(BleStatus::SUCCESS.is_success());
    }

    #[test]
    fn fixed_record_sizes() {
        let conn = ConnectionParameters {
            conn_interval: 0x0028,
            conn_latency: 0,
            supervision_timeout: 0x01F4,
            central_clock_accuracy: 1,
        };
        assert_eq!(conn.wire_size(), 7);

        let adv = AdvertisingParameters {
            min_interval: 0x0800,
            max_interval: 0x0800,
            advertising_type: 0,
            own_address_type: AddressType::Public,
            peer_address_type: AddressType::Public,
            peer_address: DeviceAddress::default(),
            channel_map: 0x07,
            filter_policy: 0,
        };
        assert_eq!(adv.wire_size(), 15);

        let scan = ScanningParameters {
            scan_type: 1,
            interval: 0x10,
            window: 0x10,
            own_address_type: AddressType::Random,
            filter_policy: 0,
            scanning_phys: 1,
        };
        assert_eq!(scan.wire_size(), 8);

        let pairing = PairingParameters {
            with_bonding: true,
            security_mode_and_level: 0x11,
            max_encryption_key_size: 16,
            local_io_capabilities: IoCapabilities::DisplayYesNo,
            oob_available: false,
            central_keys: 0x07,
            peripheral_keys: 0x07,
            lesc_only: false,
            use_keypress_notifications: false,
        };
        assert_eq!(pairing.wire_size(), 9);
        roundtrip(&pairing);
    }

    #[test]
    fn ad_structure_length_covers_type_byte() {
        let data = AdvertisingData {
            structures: vec![
                AdStructure {
                    ad_type: 0x01,
                    data: vec![0x06],
                },
                AdStructure {
                    ad_type: 0x09,
                    data: b"fsci".to_vec(),
                },
            ],
        };
        let bytes = roundtrip(&data);
        assert_eq!(
            bytes,
            vec![0x02, 0x02, 0x01, 0x06, 0x05, 0x09, b'f', b's', b'c', b'i']
        );
    }

    #[test]
    fn ad_structure_zero_length_is_invalid() {
        let bytes = [0x01, 0x00];
        let mut r = WireReader::new(&bytes);
        assert_eq!(
            AdvertisingData::decode(&mut r).unwrap_err(),
            WireError::InvalidValue {
                field: "ad_length",
                value: 0
            }
        );
    }

    #[test]
    fn advertising_data_count_is_charged_to_budget() {
        // 255 claimed structures with no bytes behind them.
        let bytes = [0xFF];
        let limits = fsci_frame::DecodeLimits {
            max_record_allocation: 16,
        };
        let mut r = WireReader::with_limits(&bytes, limits);
        assert!(matches!(
            AdvertisingData::decode(&mut r).unwrap_err(),
            WireError::OutOfMemory {
                field: "ad_structures",
                ..
            }
        ));
    }

    #[test]
    fn smp_keys_every_block_combination() {
        let ltk = LtkInfo {
            ltk: vec![0xAA; 16],
            rand: vec![0xBB; 8],
            ediv: 0x1234,
        };
        let irk = [0x11; 16];
        let csrk = [0x22; 16];
        let address = IdentityAddress {
            address_type: AddressType::PublicIdentity,
            address: DeviceAddress([1, 2, 3, 4, 5, 6]),
        };

        for mask in 0u8..16 {
            let keys = SmpKeys {
                ltk: (mask & 1 != 0).then(|| ltk.clone()),
                irk: (mask & 2 != 0).then_some(irk),
                csrk: (mask & 4 != 0).then_some(csrk),
                address: (mask & 8 != 0).then_some(address.clone()),
            };
            let expected = 4
                + if mask & 1 != 0 { 1 + 16 + 1 + 8 + 2 } else { 0 }
                + if mask & 2 != 0 { 16 } else { 0 }
                + if mask & 4 != 0 { 16 } else { 0 }
                + if mask & 8 != 0 { 7 } else { 0 };
            assert_eq!(keys.wire_size(), expected, "mask {mask:#06b}");
            roundtrip(&keys);
        }
    }

    #[test]
    fn smp_keys_ltk_allocation_failure_fails_record() {
        let keys = SmpKeys {
            ltk: Some(LtkInfo {
                ltk: vec![0xAA; 16],
                rand: vec![0xBB; 8],
                ediv: 1,
            }),
            irk: None,
            csrk: None,
            address: None,
        };
        let bytes = encode_exact(&keys).unwrap();
        let limits = fsci_frame::DecodeLimits {
            max_record_allocation: 20,
        };
        let mut r = WireReader::with_limits(&bytes, limits);
        assert_eq!(
            SmpKeys::decode(&mut r).unwrap_err(),
            WireError::OutOfMemory {
                field: "rand",
                requested: 8
            }
        );
    }

    #[test]
    fn phy_event_omits_link_for_set_default() {
        assert_eq!(roundtrip(&PhyEvent::SetDefaultComplete), vec![0x00]);

        let link = PhyLink {
            device_id: 3,
            tx_phy: 2,
            rx_phy: 1,
        };
        assert_eq!(roundtrip(&PhyEvent::Read(link)), vec![0x01, 3, 2, 1]);
        assert_eq!(roundtrip(&PhyEvent::UpdateComplete(link)), vec![0x02, 3, 2, 1]);
    }

    #[test]
    fn phy_event_unknown_kind() {
        let bytes = [0x07, 0, 0, 0];
        let mut r = WireReader::new(&bytes);
        assert!(matches!(
            PhyEvent::decode(&mut r).unwrap_err(),
            WireError::InvalidValue {
                field: "phy_event_type",
                value: 7
            }
        ));
    }

    #[test]
    fn pairing_outcome_branches() {
        assert_eq!(
            roundtrip(&PairingOutcome::Success { with_bonding: true }),
            vec![1, 1]
        );
        assert_eq!(
            roundtrip(&PairingOutcome::Failed {
                reason: BleStatus(0x0305)
            }),
            vec![0, 0x05, 0x03]
        );
    }

    #[test]
    fn invalid_enum_reports_field() {
        let bytes = [0x09, 0, 0, 0, 0, 0, 0];
        let mut r = WireReader::new(&bytes);
        assert_eq!(
            IdentityAddress::decode(&mut r).unwrap_err(),
            WireError::InvalidValue {
                field: "address_type",
                value: 9
            }
        );
    }
}
