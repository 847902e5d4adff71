//! GAP opcode numbering.
//!
//! Commands and events share the GAP opcode group but use disjoint
//! tables; direction decides which one an opcode is looked up in.

use serde::Serialize;

/// Command table length: every command opcode is below this value.
pub const COMMAND_TABLE_LEN: usize = 0x3B;

/// Event table length: every event opcode is below this value.
pub const EVENT_TABLE_LEN: usize = 0x3A;

/// Optional functionality an opcode belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    Core,
    ExtendedAdvertising,
    ChannelSounding,
}

wire_enum! {
    /// Commands, host to device.
    pub enum CommandOpcode {
        CheckNotificationStatus = 0x00,
        CheckIndicationStatus = 0x01,
        GetBondedDevicesCount = 0x02,
        GetBondedDeviceName = 0x03,
        RemoveBond = 0x04,
        RemoveAllBonds = 0x05,
        LoadCustomPeerInformation = 0x06,
        SaveCustomPeerInformation = 0x07,
        CheckIfBonded = 0x08,
        SetAdvertisingParameters = 0x09,
        SetAdvertisingData = 0x0A,
        StartAdvertising = 0x0B,
        StopAdvertising = 0x0C,
        StartScanning = 0x0D,
        StopScanning = 0x0E,
        Connect = 0x0F,
        Disconnect = 0x10,
        Pair = 0x11,
        SendPeripheralSecurityRequest = 0x12,
        EncryptLink = 0x13,
        AcceptPairingRequest = 0x14,
        RejectPairing = 0x15,
        EnterPasskey = 0x16,
        ProvideOob = 0x17,
        SendSmpKeys = 0x18,
        ProvideLongTermKey = 0x19,
        DenyLongTermKey = 0x1A,
        LoadEncryptionInformation = 0x1B,
        SetLocalPasskey = 0x1C,
        UpdateConnectionParameters = 0x1D,
        UpdateLeDataLength = 0x1E,
        EnableHostPrivacy = 0x1F,
        ReadPublicDeviceAddress = 0x20,
        CreateRandomDeviceAddress = 0x21,
        SaveDeviceName = 0x22,
        LeSetPhy = 0x23,
        LeReadPhy = 0x24,
        SetExtAdvertisingParameters = 0x26,
        SetExtAdvertisingData = 0x27,
        StartExtAdvertising = 0x28,
        StopExtAdvertising = 0x29,
        RemoveAdvertisingSet = 0x2A,
        SetPeriodicAdvParameters = 0x2B,
        SetPeriodicAdvertisingData = 0x2C,
        StartPeriodicAdvertising = 0x2D,
        StopPeriodicAdvertising = 0x2E,
        SetConnectionlessCteTransmitParameters = 0x2F,
        CsReadLocalSupportedCapabilities = 0x30,
        CsReadRemoteSupportedCapabilities = 0x31,
        CsCreateConfig = 0x32,
        CsRemoveConfig = 0x33,
        CsSecurityEnable = 0x34,
        CsSetDefaultSettings = 0x35,
        CsSetProcedureParameters = 0x36,
        CsProcedureEnable = 0x37,
        CsSetChannelClassification = 0x38,
        CsTest = 0x39,
        CsTestEnd = 0x3A,
    }
}

impl CommandOpcode {
    pub fn feature(self) -> Feature {
        match u8::from(self) {
            0x26..=0x2F => Feature::ExtendedAdvertising,
            0x30..=0x3A => Feature::ChannelSounding,
            _ => Feature::Core,
        }
    }

    /// The completion event that carries this command's result, if the
    /// result arrives after the command status.
    pub fn completion(self) -> Option<EventOpcode> {
        match self {
            Self::CheckNotificationStatus => Some(EventOpcode::CheckNotificationStatusResult),
            Self::CheckIndicationStatus => Some(EventOpcode::CheckIndicationStatusResult),
            Self::GetBondedDevicesCount => Some(EventOpcode::GetBondedDevicesCountResult),
            Self::GetBondedDeviceName => Some(EventOpcode::GetBondedDeviceNameResult),
            Self::LoadCustomPeerInformation => {
                Some(EventOpcode::LoadCustomPeerInformationResult)
            }
            Self::CheckIfBonded => Some(EventOpcode::CheckIfBondedResult),
            Self::LoadEncryptionInformation => {
                Some(EventOpcode::LoadEncryptionInformationResult)
            }
            _ => None,
        }
    }
}

wire_enum! {
    /// Events, device to host.
    pub enum EventOpcode {
        CommandStatus = 0x00,
        CheckNotificationStatusResult = 0x01,
        CheckIndicationStatusResult = 0x02,
        GetBondedDevicesCountResult = 0x03,
        GetBondedDeviceNameResult = 0x04,
        LoadCustomPeerInformationResult = 0x05,
        CheckIfBondedResult = 0x06,
        LoadEncryptionInformationResult = 0x07,
        InitializationComplete = 0x08,
        InternalError = 0x09,
        AdvertisingSetupFailed = 0x0A,
        AdvParamsSetupComplete = 0x0B,
        AdvDataSetupComplete = 0x0C,
        FilterAcceptListSizeRead = 0x0D,
        PublicAddressRead = 0x0E,
        RandomAddressReady = 0x0F,
        ControllerResetComplete = 0x10,
        LeScLocalOobData = 0x11,
        TxPowerLevelRead = 0x12,
        PhyEvent = 0x13,
        AdvertisingStateChanged = 0x14,
        AdvertisingCommandFailed = 0x15,
        ScanningStateChanged = 0x16,
        ScanCommandFailed = 0x17,
        DeviceScanned = 0x18,
        Connected = 0x19,
        Disconnected = 0x1A,
        ConnParamUpdateRequest = 0x1B,
        ConnParamUpdateComplete = 0x1C,
        LeDataLengthChanged = 0x1D,
        PairingRequest = 0x1E,
        PeripheralSecurityRequest = 0x1F,
        PasskeyRequest = 0x20,
        PasskeyDisplay = 0x21,
        KeyExchangeRequest = 0x22,
        KeysReceived = 0x23,
        LongTermKeyRequest = 0x24,
        EncryptionChanged = 0x25,
        PairingComplete = 0x26,
        RssiRead = 0x27,
        ChannelMapRead = 0x28,
        ExtAdvParamsSetupComplete = 0x2A,
        ExtAdvDataSetupComplete = 0x2B,
        PeriodicAdvParamSetupComplete = 0x2C,
        PeriodicAdvDataSetupComplete = 0x2D,
        AdvertisingSetTerminated = 0x2E,
        ScanRequestReceived = 0x2F,
        ExtDeviceScanned = 0x30,
        CsLocalCapabilities = 0x31,
        CsRemoteCapabilitiesComplete = 0x32,
        CsConfigComplete = 0x33,
        CsSecurityEnableComplete = 0x34,
        CsProcedureEnableComplete = 0x35,
        CsSubeventResult = 0x36,
        CsSubeventResultContinue = 0x37,
        CsTestEndComplete = 0x38,
        CsError = 0x39,
    }
}

impl EventOpcode {
    pub fn feature(self) -> Feature {
        match u8::from(self) {
            0x2A..=0x30 => Feature::ExtendedAdvertising,
            0x31..=0x39 => Feature::ChannelSounding,
            _ => Feature::Core,
        }
    }

    /// Whether this event completes a relayed command.
    pub fn is_completion(self) -> bool {
        (0x01..=0x07).contains(&u8::from(self))
    }
}
