//! Event payloads, device to host.

use fsci_frame::{WireReader, WireResult, WireWriter};
use serde::Serialize;

use crate::cs::{
    CsCapabilities, CsConfigComplete, CsError, CsProcedureEnableComplete, CsRemoteCapabilities,
    CsSecurityEnableComplete, CsSubeventResult, CsSubeventResultContinue,
};
use crate::marshal::Marshal;
use crate::opcode::EventOpcode;
use crate::types::{
    AddressType, BleStatus, ConnectionParameters, DeviceAddress, DeviceId, DevicePairing,
    DeviceRef, Empty, IdentityAddress, PairingOutcome, PhyEvent, Role, SmpKeys, StatusEvent,
};

record! {
    /// Acknowledges every command.
    pub struct CommandStatus {
        pub status: BleStatus,
    }
}

record! {
    pub struct BoolResult {
        pub value: bool,
    }
}

record! {
    pub struct CountResult {
        pub count: u8,
    }
}

record! {
    pub struct DeviceNameResult {
        pub name: Vec<u8> => len_u8,
    }
}

record! {
    pub struct PeerInformationResult {
        pub info: Vec<u8> => len_u16,
    }
}

record! {
    pub struct BondedResult {
        pub is_bonded: bool,
        pub nvm_index: u8,
    }
}

record! {
    pub struct EncryptionInformationResult {
        pub ltk: Vec<u8> => len_u8,
    }
}

record! {
    pub struct InitializationComplete {
        pub supported_features: u32,
        pub max_adv_data_size: u16,
        pub num_adv_sets: u8,
        pub num_periodic_adv_sets: u8,
    }
}

record! {
    pub struct InternalError {
        pub error_code: BleStatus,
        pub error_source: u8,
        pub hci_command_opcode: u16,
    }
}

record! {
    pub struct FilterAcceptListSize {
        pub size: u8,
    }
}

record! {
    pub struct PublicAddressRead {
        pub address: DeviceAddress,
    }
}

record! {
    pub struct RandomAddressReady {
        pub address: DeviceAddress,
        pub advertising_handle: u8,
    }
}

record! {
    pub struct LeScLocalOobData {
        pub random: [u8; 16],
        pub confirm: [u8; 16],
    }
}

record! {
    pub struct TxPowerLevelRead {
        pub kind: u8,
        pub level: i8,
    }
}

record! {
    pub struct DeviceScanned {
        pub address_type: AddressType,
        pub address: DeviceAddress,
        pub rssi: i8,
        pub advertising_event_type: u8,
        pub direct_rpa: Option<IdentityAddress>,
        pub advertising_address_resolved: bool,
        pub data: Vec<u8> => len_u8,
    }
}

record! {
    pub struct Connected {
        pub device_id: DeviceId,
        pub parameters: ConnectionParameters,
        pub peer_address_type: AddressType,
        pub peer_address: DeviceAddress,
        /// Present when the peer's resolvable private address was resolved.
        pub peer_rpa: Option<DeviceAddress>,
        /// Present when a local resolvable private address was used.
        pub local_rpa: Option<DeviceAddress>,
        pub role: Role,
    }
}

impl Connected {
    /// Size with neither optional address.
    pub const BASE_SIZE: usize = 18;
}

record! {
    pub struct Disconnected {
        pub device_id: DeviceId,
        pub reason: BleStatus,
    }
}

record! {
    pub struct ConnParamUpdateRequest {
        pub device_id: DeviceId,
        pub interval_min: u16,
        pub interval_max: u16,
        pub peripheral_latency: u16,
        pub timeout: u16,
    }
}

record! {
    pub struct ConnParamUpdateComplete {
        pub device_id: DeviceId,
        pub status: BleStatus,
        pub conn_interval: u16,
        pub conn_latency: u16,
        pub supervision_timeout: u16,
    }
}

record! {
    pub struct LeDataLengthChanged {
        pub device_id: DeviceId,
        pub max_tx_octets: u16,
        pub max_tx_time: u16,
        pub max_rx_octets: u16,
        pub max_rx_time: u16,
    }
}

record! {
    pub struct PeripheralSecurityRequest {
        pub device_id: DeviceId,
        pub bonding_required: bool,
        pub authentication_required: bool,
    }
}

record! {
    pub struct PasskeyDisplay {
        pub device_id: DeviceId,
        pub passkey: u32,
    }
}

record! {
    pub struct KeyExchangeRequest {
        pub device_id: DeviceId,
        pub requested_keys: u8,
        pub ltk_size: u8,
    }
}

record! {
    pub struct KeysReceived {
        pub device_id: DeviceId,
        pub keys: SmpKeys,
    }
}

record! {
    pub struct LongTermKeyRequest {
        pub device_id: DeviceId,
        pub ediv: u16,
        pub rand: Vec<u8> => len_u8,
    }
}

record! {
    pub struct EncryptionChanged {
        pub device_id: DeviceId,
        pub encrypted: bool,
    }
}

record! {
    pub struct PairingComplete {
        pub device_id: DeviceId,
        pub outcome: PairingOutcome,
    }
}

record! {
    pub struct RssiRead {
        pub device_id: DeviceId,
        pub rssi: i8,
    }
}

record! {
    pub struct ChannelMapRead {
        pub device_id: DeviceId,
        pub channel_map: [u8; 5],
    }
}

record! {
    pub struct ExtAdvParamsSetupComplete {
        pub selected_tx_power: i8,
    }
}

record! {
    pub struct AdvertisingSetTerminated {
        pub status: BleStatus,
        pub handle: u8,
        pub device_id: DeviceId,
        pub num_completed_ext_adv_events: u8,
    }
}

record! {
    pub struct ScanRequestReceived {
        pub handle: u8,
        pub scanner_address_type: AddressType,
        pub scanner_address: DeviceAddress,
        pub scanner_address_resolved: bool,
    }
}

record! {
    pub struct ExtDeviceScanned {
        pub address_type: AddressType,
        pub address: DeviceAddress,
        pub sid: u8,
        pub advertising_properties: u8,
        pub rssi: i8,
        pub tx_power: i8,
        pub primary_phy: u8,
        pub secondary_phy: u8,
        pub periodic_adv_interval: u16,
        pub direct_rpa: Option<IdentityAddress>,
        pub advertising_address_resolved: bool,
        pub data: Vec<u8> => len_u16,
    }
}

macro_rules! event_set {
    ($( $variant:ident($payload:ty) ),+ $(,)?) => {
        /// A decoded GAP event.
        #[derive(Debug, Clone, PartialEq, Eq, Serialize)]
        #[serde(tag = "event", content = "params")]
        pub enum Event {
            $( $variant($payload), )+
        }

        impl Event {
            pub fn opcode(&self) -> EventOpcode {
                match self {
                    $( Self::$variant(_) => EventOpcode::$variant, )+
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
            pub fn decode(opcode: EventOpcode, r: &mut WireReader<'_>) -> WireResult<Self> {
                match opcode {
                    $( EventOpcode::$variant => <$payload>::decode(r).map(Self::$variant), )+
                }
            }
        }
    };
}

event_set! {
    CommandStatus(CommandStatus),
    CheckNotificationStatusResult(BoolResult),
    CheckIndicationStatusResult(BoolResult),
    GetBondedDevicesCountResult(CountResult),
    GetBondedDeviceNameResult(DeviceNameResult),
    LoadCustomPeerInformationResult(PeerInformationResult),
    CheckIfBondedResult(BondedResult),
    LoadEncryptionInformationResult(EncryptionInformationResult),
    InitializationComplete(InitializationComplete),
    InternalError(InternalError),
    AdvertisingSetupFailed(StatusEvent),
    AdvParamsSetupComplete(Empty),
    AdvDataSetupComplete(Empty),
    FilterAcceptListSizeRead(FilterAcceptListSize),
    PublicAddressRead(PublicAddressRead),
    RandomAddressReady(RandomAddressReady),
    ControllerResetComplete(Empty),
    LeScLocalOobData(LeScLocalOobData),
    TxPowerLevelRead(TxPowerLevelRead),
    PhyEvent(PhyEvent),
    AdvertisingStateChanged(Empty),
    AdvertisingCommandFailed(StatusEvent),
    ScanningStateChanged(Empty),
    ScanCommandFailed(StatusEvent),
    DeviceScanned(DeviceScanned),
    Connected(Connected),
    Disconnected(Disconnected),
    ConnParamUpdateRequest(ConnParamUpdateRequest),
    ConnParamUpdateComplete(ConnParamUpdateComplete),
    LeDataLengthChanged(LeDataLengthChanged),
    PairingRequest(DevicePairing),
    PeripheralSecurityRequest(PeripheralSecurityRequest),
    PasskeyRequest(DeviceRef),
    PasskeyDisplay(PasskeyDisplay),
    KeyExchangeRequest(KeyExchangeRequest),
    KeysReceived(KeysReceived),
    LongTermKeyRequest(LongTermKeyRequest),
    EncryptionChanged(EncryptionChanged),
    PairingComplete(PairingComplete),
    RssiRead(RssiRead),
    ChannelMapRead(ChannelMapRead),
    ExtAdvParamsSetupComplete(ExtAdvParamsSetupComplete),
    ExtAdvDataSetupComplete(Empty),
    PeriodicAdvParamSetupComplete(Empty),
    PeriodicAdvDataSetupComplete(Empty),
    AdvertisingSetTerminated(AdvertisingSetTerminated),
    ScanRequestReceived(ScanRequestReceived),
    ExtDeviceScanned(ExtDeviceScanned),
    CsLocalCapabilities(CsCapabilities),
    CsRemoteCapabilitiesComplete(CsRemoteCapabilities),
    CsConfigComplete(CsConfigComplete),
    CsSecurityEnableComplete(CsSecurityEnableComplete),
    CsProcedureEnableComplete(CsProcedureEnableComplete),
    CsSubeventResult(CsSubeventResult),
    CsSubeventResultContinue(CsSubeventResultContinue),
    CsTestEndComplete(StatusEvent),
    CsError(CsError),
}
