//! Channel-sounding records.

use fsci_frame::{WireReader, WireResult, WireWriter};
use serde::Serialize;

use crate::marshal::Marshal;
use crate::steps::StepList;
use crate::types::{BleStatus, DeviceId};

wire_enum! {
    /// Whether a subevent's step list is finished.
    pub enum DoneStatus {
        Complete = 0x00,
        /// More steps follow in a continue event.
        Partial = 0x01,
        Aborted = 0x0F,
    }
}

impl DoneStatus {
    /// Whether no further continue events belong to this subevent.
    pub fn is_final(self) -> bool {
        !matches!(self, Self::Partial)
    }
}

record! {
    pub struct CsCapabilities {
        pub num_config_supported: u8,
        pub max_consecutive_procedures_supported: u16,
        pub num_antennas_supported: u8,
        pub max_antenna_paths_supported: u8,
        pub roles_supported: u8,
        pub modes_supported: u8,
        pub rtt_capability: u8,
        pub rtt_aa_only_n: u8,
        pub rtt_sounding_n: u8,
        pub rtt_random_payload_n: u8,
        pub nadm_sounding_capability: u16,
        pub nadm_random_capability: u16,
        pub cs_sync_phys_supported: u8,
        pub subfeatures_supported: u16,
        pub t_ip1_times_supported: u16,
        pub t_ip2_times_supported: u16,
        pub t_fcs_times_supported: u16,
        pub t_pm_times_supported: u16,
        pub t_sw_time_supported: u8,
        pub tx_snr_capability: u8,
    }
}

record! {
    pub struct CsRemoteCapabilities {
        pub device_id: DeviceId,
        pub status: BleStatus,
        pub capabilities: CsCapabilities,
    }
}

record! {
    /// Mode and channel selection shared by config creation and its report.
    pub struct CsModeConfig {
        pub main_mode_type: u8,
        pub sub_mode_type: u8,
        pub min_main_mode_steps: u8,
        pub max_main_mode_steps: u8,
        pub main_mode_repetition: u8,
        pub mode0_steps: u8,
        pub role: u8,
        pub rtt_type: u8,
        pub cs_sync_phy: u8,
        pub channel_map: [u8; 10],
        pub channel_map_repetition: u8,
        pub channel_selection_type: u8,
        pub ch3c_shape: u8,
        pub ch3c_jump: u8,
    }
}

record! {
    pub struct CsCreateConfig {
        pub device_id: DeviceId,
        pub config_id: u8,
        pub create_context: u8,
        pub mode: CsModeConfig,
    }
}

record! {
    pub struct CsConfigRef {
        pub device_id: DeviceId,
        pub config_id: u8,
    }
}

record! {
    pub struct CsConfigComplete {
        pub device_id: DeviceId,
        pub status: BleStatus,
        pub config_id: u8,
        pub action: u8,
        pub mode: CsModeConfig,
        pub t_ip1_time: u8,
        pub t_ip2_time: u8,
        pub t_fcs_time: u8,
        pub t_pm_time: u8,
    }
}

record! {
    pub struct CsDefaultSettings {
        pub device_id: DeviceId,
        pub role_enable: u8,
        pub cs_sync_antenna_selection: u8,
        pub max_tx_power: i8,
    }
}

record! {
    pub struct CsProcedureParameters {
        pub device_id: DeviceId,
        pub config_id: u8,
        pub max_procedure_len: u16,
        pub min_procedure_interval: u16,
        pub max_procedure_interval: u16,
        pub max_procedure_count: u16,
        pub min_subevent_len: u32 => u24,
        pub max_subevent_len: u32 => u24,
        pub tone_antenna_config_selection: u8,
        pub phy: u8,
        pub tx_power_delta: u8,
        pub preferred_peer_antenna: u8,
        pub snr_control_initiator: u8,
        pub snr_control_reflector: u8,
    }
}

record! {
    pub struct CsProcedureEnable {
        pub device_id: DeviceId,
        pub config_id: u8,
        pub enable: bool,
    }
}

record! {
    pub struct CsChannelClassification {
        pub channel_classification: [u8; 10],
    }
}

record! {
    pub struct CsTestParameters {
        pub main_mode_type: u8,
        pub sub_mode_type: u8,
        pub main_mode_repetition: u8,
        pub mode0_steps: u8,
        pub role: u8,
        pub rtt_type: u8,
        pub cs_sync_phy: u8,
        pub cs_sync_antenna_selection: u8,
        pub subevent_len: u32 => u24,
        pub subevent_interval: u16,
        pub max_num_subevents: u8,
        pub transmit_power_level: i8,
        pub t_ip1_time: u8,
        pub t_ip2_time: u8,
        pub t_fcs_time: u8,
        pub t_pm_time: u8,
        pub t_sw_time: u8,
        pub tone_antenna_config_selection: u8,
        pub snr_control_initiator: u8,
        pub snr_control_reflector: u8,
        pub drbg_nonce: u16,
        pub channel_map_repetition: u8,
        pub override_config: u16,
        pub override_parameters: Vec<u8> => len_u8,
    }
}

record! {
    pub struct CsSecurityEnableComplete {
        pub device_id: DeviceId,
        pub status: BleStatus,
    }
}

record! {
    pub struct CsProcedureEnableComplete {
        pub device_id: DeviceId,
        pub status: BleStatus,
        pub config_id: u8,
        pub state: bool,
        pub tone_antenna_config_selection: u8,
        pub selected_tx_power: i8,
        pub subevent_len: u32 => u24,
        pub subevents_per_event: u8,
        pub subevent_interval: u16,
        pub event_interval: u16,
        pub procedure_interval: u16,
        pub procedure_count: u16,
        pub max_procedure_len: u16,
    }
}

record! {
    pub struct CsError {
        pub device_id: DeviceId,
        pub error: BleStatus,
    }
}

/// First message of a subevent's results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CsSubeventResult {
    pub device_id: DeviceId,
    pub config_id: u8,
    pub start_acl_conn_event: u16,
    pub procedure_counter: u16,
    pub frequency_compensation: i16,
    pub reference_power_level: i8,
    pub procedure_done_status: DoneStatus,
    pub subevent_done_status: DoneStatus,
    pub abort_reason: u8,
    pub num_antenna_paths: u8,
    pub steps: StepList,
}

impl CsSubeventResult {
    /// Bytes before the step list.
    pub const HEADER_SIZE: usize = 14;
}

impl Marshal for CsSubeventResult {
    fn wire_size(&self) -> usize {
        Self::HEADER_SIZE + self.steps.wire_size()
    }

    fn encode(&self, w: &mut WireWriter) -> WireResult<()> {
        w.put_u8(self.device_id)?;
        w.put_u8(self.config_id)?;
        w.put_u16(self.start_acl_conn_event)?;
        w.put_u16(self.procedure_counter)?;
        w.put_i16(self.frequency_compensation)?;
        w.put_i8(self.reference_power_level)?;
        self.procedure_done_status.encode(w)?;
        self.subevent_done_status.encode(w)?;
        w.put_u8(self.abort_reason)?;
        w.put_u8(self.num_antenna_paths)?;
        // Reserved.
        w.put_u8(0)?;
        self.steps.encode(w)
    }

    fn decode(r: &mut WireReader<'_>) -> WireResult<Self> {
        let device_id = r.u8("device_id")?;
        let config_id = r.u8("config_id")?;
        let start_acl_conn_event = r.u16("start_acl_conn_event")?;
        let procedure_counter = r.u16("procedure_counter")?;
        let frequency_compensation = r.i16("frequency_compensation")?;
        let reference_power_level = r.i8("reference_power_level")?;
        let procedure_done_status = r.enum_u8("procedure_done_status")?;
        let subevent_done_status = r.enum_u8("subevent_done_status")?;
        let abort_reason = r.u8("abort_reason")?;
        let num_antenna_paths = r.u8("num_antenna_paths")?;
        r.skip("reserved", 1)?;
        let steps = StepList::decode(r)?;
        Ok(Self {
            device_id,
            config_id,
            start_acl_conn_event,
            procedure_counter,
            frequency_compensation,
            reference_power_level,
            procedure_done_status,
            subevent_done_status,
            abort_reason,
            num_antenna_paths,
            steps,
        })
    }
}

record! {
    /// Further steps of a subevent started by a [`CsSubeventResult`].
    pub struct CsSubeventResultContinue {
        pub device_id: DeviceId,
        pub config_id: u8,
        pub procedure_done_status: DoneStatus,
        pub subevent_done_status: DoneStatus,
        pub abort_reason: u8,
        pub num_antenna_paths: u8,
        pub steps: StepList,
    }
}

impl CsSubeventResultContinue {
    /// Bytes before the step list.
    pub const HEADER_SIZE: usize = 6;
}
