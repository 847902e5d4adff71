//! Command payloads, host to device.

use fsci_frame::{WireReader, WireResult, WireWriter};
use serde::Serialize;

use crate::cs::{
    CsChannelClassification, CsConfigRef, CsCreateConfig, CsDefaultSettings, CsProcedureEnable,
    CsProcedureParameters, CsTestParameters,
};
use crate::marshal::Marshal;
use crate::opcode::CommandOpcode;
use crate::types::{
    AddressType, AdvHandle, AdvertisingData, AdvertisingParameters, ConnectionRequestParameters,
    DeviceAddress, DeviceId, DevicePairing, DeviceRef, Empty, ScanningParameters, SmpKeys,
};

record! {
    /// Query the CCCD of a characteristic on one connection.
    pub struct CccdQuery {
        pub device_id: DeviceId,
        pub handle: u16,
    }
}

record! {
    pub struct GetBondedDeviceName {
        pub nvm_index: u8,
        pub max_name_size: u8,
    }
}

record! {
    pub struct RemoveBond {
        pub nvm_index: u8,
    }
}

record! {
    pub struct LoadCustomPeerInformation {
        pub device_id: DeviceId,
        pub offset: u16,
        pub size: u16,
    }
}

record! {
    pub struct SaveCustomPeerInformation {
        pub device_id: DeviceId,
        pub offset: u16,
        pub info: Vec<u8> => len_u16,
    }
}

record! {
    pub struct SetAdvertisingData {
        pub advertising_data: Option<AdvertisingData>,
        pub scan_response_data: Option<AdvertisingData>,
    }
}

record! {
    pub struct StartScanning {
        pub parameters: Option<ScanningParameters>,
        pub filter_duplicates: u8,
    }
}

record! {
    pub struct RejectPairing {
        pub device_id: DeviceId,
        pub reason: u16,
    }
}

record! {
    pub struct Passkey {
        pub device_id: DeviceId,
        pub passkey: u32,
    }
}

record! {
    pub struct ProvideOob {
        pub device_id: DeviceId,
        pub oob: [u8; 16],
    }
}

record! {
    pub struct SendSmpKeys {
        pub device_id: DeviceId,
        pub keys: SmpKeys,
    }
}

record! {
    pub struct ProvideLongTermKey {
        pub device_id: DeviceId,
        pub ltk: Vec<u8> => len_u8,
    }
}

record! {
    pub struct SetLocalPasskey {
        pub passkey: u32,
    }
}

record! {
    pub struct UpdateConnectionParameters {
        pub device_id: DeviceId,
        pub interval_min: u16,
        pub interval_max: u16,
        pub peripheral_latency: u16,
        pub timeout: u16,
        pub min_ce_length: u16,
        pub max_ce_length: u16,
    }
}

record! {
    pub struct UpdateLeDataLength {
        pub device_id: DeviceId,
        pub tx_octets: u16,
        pub tx_time: u16,
    }
}

record! {
    pub struct EnableHostPrivacy {
        pub enable: bool,
        pub irk: Option<[u8; 16]>,
    }
}

record! {
    pub struct CreateRandomDeviceAddress {
        pub irk: Option<[u8; 16]>,
        pub random_part: Option<[u8; 3]>,
    }
}

record! {
    pub struct SaveDeviceName {
        pub device_id: DeviceId,
        pub name: Vec<u8> => len_u8,
    }
}

record! {
    pub struct LeSetPhy {
        pub device_id: DeviceId,
        pub all_phys: u8,
        pub tx_phys: u8,
        pub rx_phys: u8,
        pub phy_options: u16,
    }
}

record! {
    pub struct ExtAdvertisingParameters {
        pub handle: u8,
        pub sid: u8,
        pub event_properties: u16,
        pub min_interval: u32 => u24,
        pub max_interval: u32 => u24,
        pub channel_map: u8,
        pub own_address_type: AddressType,
        pub peer_address_type: AddressType,
        pub peer_address: DeviceAddress,
        pub filter_policy: u8,
        pub tx_power: i8,
        pub primary_phy: u8,
        pub secondary_phy: u8,
        pub secondary_adv_max_skip: u8,
        pub enable_scan_req_notification: bool,
    }
}

record! {
    pub struct SetExtAdvertisingData {
        pub handle: u8,
        pub advertising_data: Option<AdvertisingData>,
        pub scan_response_data: Option<AdvertisingData>,
    }
}

record! {
    pub struct StartExtAdvertising {
        pub handle: u8,
        pub duration: u16,
        pub max_ext_adv_events: u8,
    }
}

record! {
    pub struct PeriodicAdvParameters {
        pub handle: u8,
        pub include_tx_power: bool,
        pub interval_min: u16,
        pub interval_max: u16,
    }
}

record! {
    pub struct SetPeriodicAdvertisingData {
        pub handle: u8,
        pub data: AdvertisingData,
    }
}

record! {
    pub struct CteTransmitParameters {
        pub handle: u8,
        pub cte_length: u8,
        pub cte_type: u8,
        pub cte_count: u8,
        pub antenna_ids: Vec<u8> => len_u8,
    }
}

macro_rules! command_set {
    ($( $variant:ident($payload:ty) ),+ $(,)?) => {
        /// A decoded GAP command.
        #[derive(Debug, Clone, PartialEq, Eq, Serialize)]
        #[serde(tag = "command", content = "params")]
        pub enum Command {
            $( $variant($payload), )+
        }

        impl Command {
            pub fn opcode(&self) -> CommandOpcode {
                match self {
                    $( Self::$variant(_) => CommandOpcode::$variant, )+
                }
            }

            /// Payload size in bytes.
            pub fn wire_size(&self) -> usize {
                match self {
                    $( Self::$variant(p) => p.wire_size(), )+
                }
            }

            pub fn encode(&self, w: &mut WireWriter) -> WireResult<()> {
                match self {
                    $( Self::$variant(p) => p.encode(w), )+
                }
            }

            /// Decode the payload of `opcode`.
            pub fn decode(opcode: CommandOpcode, r: &mut WireReader<'_>) -> WireResult<Self> {
                match opcode {
                    $( CommandOpcode::$variant => <$payload>::decode(r).map(Self::$variant), )+
                }
            }
        }
    };
}

command_set! {
    CheckNotificationStatus(CccdQuery),
    CheckIndicationStatus(CccdQuery),
    GetBondedDevicesCount(Empty),
    GetBondedDeviceName(GetBondedDeviceName),
    RemoveBond(RemoveBond),
    RemoveAllBonds(Empty),
    LoadCustomPeerInformation(LoadCustomPeerInformation),
    SaveCustomPeerInformation(SaveCustomPeerInformation),
    CheckIfBonded(DeviceRef),
    SetAdvertisingParameters(AdvertisingParameters),
    SetAdvertisingData(SetAdvertisingData),
    StartAdvertising(Empty),
    StopAdvertising(Empty),
    StartScanning(StartScanning),
    StopScanning(Empty),
    Connect(ConnectionRequestParameters),
    Disconnect(DeviceRef),
    Pair(DevicePairing),
    SendPeripheralSecurityRequest(DevicePairing),
    EncryptLink(DeviceRef),
    AcceptPairingRequest(DevicePairing),
    RejectPairing(RejectPairing),
    EnterPasskey(Passkey),
    ProvideOob(ProvideOob),
    SendSmpKeys(SendSmpKeys),
    ProvideLongTermKey(ProvideLongTermKey),
    DenyLongTermKey(DeviceRef),
    LoadEncryptionInformation(DeviceRef),
    SetLocalPasskey(SetLocalPasskey),
    UpdateConnectionParameters(UpdateConnectionParameters),
    UpdateLeDataLength(UpdateLeDataLength),
    EnableHostPrivacy(EnableHostPrivacy),
    ReadPublicDeviceAddress(Empty),
    CreateRandomDeviceAddress(CreateRandomDeviceAddress),
    SaveDeviceName(SaveDeviceName),
    LeSetPhy(LeSetPhy),
    LeReadPhy(DeviceRef),
    SetExtAdvertisingParameters(ExtAdvertisingParameters),
    SetExtAdvertisingData(SetExtAdvertisingData),
    StartExtAdvertising(StartExtAdvertising),
    StopExtAdvertising(AdvHandle),
    RemoveAdvertisingSet(AdvHandle),
    SetPeriodicAdvParameters(PeriodicAdvParameters),
    SetPeriodicAdvertisingData(SetPeriodicAdvertisingData),
    StartPeriodicAdvertising(AdvHandle),
    StopPeriodicAdvertising(AdvHandle),
    SetConnectionlessCteTransmitParameters(CteTransmitParameters),
    CsReadLocalSupportedCapabilities(Empty),
    CsReadRemoteSupportedCapabilities(DeviceRef),
    CsCreateConfig(CsCreateConfig),
    CsRemoveConfig(CsConfigRef),
    CsSecurityEnable(DeviceRef),
    CsSetDefaultSettings(CsDefaultSettings),
    CsSetProcedureParameters(CsProcedureParameters),
    CsProcedureEnable(CsProcedureEnable),
    CsSetChannelClassification(CsChannelClassification),
    CsTest(CsTestParameters),
    CsTestEnd(Empty),
}
