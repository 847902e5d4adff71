use fsci_frame::DecodeLimits;
use fsci_records::Feature;
use serde::Serialize;

/// Default largest payload for one piece of a fragmented message.
pub const DEFAULT_MAX_FRAGMENT_PAYLOAD: usize = 255;

/// Optional table sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Features {
    /// Extended and periodic advertising commands and events.
    pub extended_advertising: bool,
    /// Channel-sounding commands and events.
    pub channel_sounding: bool,
}

impl Features {
    /// Every optional section enabled.
    pub const fn all() -> Self {
        Self {
            extended_advertising: true,
            channel_sounding: true,
        }
    }

    /// Core GAP only.
    pub const fn core() -> Self {
        Self {
            extended_advertising: false,
            channel_sounding: false,
        }
    }

    /// Sections selected by this crate's cargo features.
    pub const fn from_build() -> Self {
        Self {
            extended_advertising: cfg!(feature = "extended-adv"),
            channel_sounding: cfg!(feature = "channel-sounding"),
        }
    }

    pub fn enables(&self, feature: Feature) -> bool {
        match feature {
            Feature::Core => true,
            Feature::ExtendedAdvertising => self.extended_advertising,
            Feature::ChannelSounding => self.channel_sounding,
        }
    }
}

impl Default for Features {
    fn default() -> Self {
        Self::from_build()
    }
}

/// Controls dispatcher behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchConfig {
    /// Channel this dispatcher serves.
    pub interface_id: u8,
    /// Sections populated in the opcode tables.
    pub features: Features,
    /// Allocation limits applied to every decoded record.
    pub limits: DecodeLimits,
    /// Largest payload of one outbound piece of a split subevent result.
    pub max_fragment_payload: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            interface_id: 0,
            features: Features::default(),
            limits: DecodeLimits::default(),
            max_fragment_payload: DEFAULT_MAX_FRAGMENT_PAYLOAD,
        }
    }
}
