//! Event types for sync lifecycle notifications.
//!
//! Backends report what they are doing as [`BackendEvent`]s, one variant per callback
//! of the underlying protocol. The session layer converts each of them into a
//! [`SyncEvent`], which is what listeners receive. Start and finish callbacks carry no
//! counters, so their converted events report zeros.

use std::fmt;

use serde_repr::{Deserialize_repr, Serialize_repr};

/// Stage of a multi-step sync operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum Phase {
    Start = 0,
    Progress = 1,
    Finish = 2,
}

/// Numeric code attached to every reported sync failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize_repr, Deserialize_repr)]
#[repr(i32)]
pub enum SyncErrorCode {
    Canceled = 1,
    DeadlineExceeded = 2,
    InvalidPeerAddress = 3,
    Unspecified = -1,
}

impl SyncErrorCode {
    pub fn code(self) -> i32 {
        self as i32
    }
}

impl fmt::Display for SyncErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Events delivered to sync listeners.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    Synced(bool),
    PeerConnected {
        peer_count: i32,
    },
    PeerDisconnected {
        peer_count: i32,
    },
    FetchedHeaders {
        count: i32,
        last_header_time: i64,
        phase: Phase,
    },
    FetchMissingCFilters {
        start: i32,
        end: i32,
        phase: Phase,
    },
    DiscoveredAddresses {
        phase: Phase,
    },
    Rescan {
        through_height: i32,
        phase: Phase,
    },
    SyncError {
        code: SyncErrorCode,
        message: String,
    },
}

impl SyncEvent {
    /// Short description for log lines.
    pub fn description(&self) -> String {
        match self {
            SyncEvent::Synced(synced) => format!("Synced({})", synced),
            SyncEvent::PeerConnected { peer_count } => format!("PeerConnected({})", peer_count),
            SyncEvent::PeerDisconnected { peer_count } => {
                format!("PeerDisconnected({})", peer_count)
            }
            SyncEvent::FetchedHeaders { count, phase, .. } => {
                format!("FetchedHeaders({}, {:?})", count, phase)
            }
            SyncEvent::FetchMissingCFilters { start, end, phase } => {
                format!("FetchMissingCFilters({}..{}, {:?})", start, end, phase)
            }
            SyncEvent::DiscoveredAddresses { phase } => format!("DiscoveredAddresses({:?})", phase),
            SyncEvent::Rescan {
                through_height,
                phase,
            } => format!("Rescan({}, {:?})", through_height, phase),
            SyncEvent::SyncError { code, message } => format!("SyncError({}: {})", code, message),
        }
    }
}

/// Callbacks raised by a running network backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendEvent {
    Synced(bool),
    FetchHeadersStarted,
    FetchHeadersProgress {
        fetched_headers: i32,
        last_header_time: i64,
    },
    FetchHeadersFinished,
    FetchMissingCFiltersStarted,
    FetchMissingCFiltersProgress {
        start: i32,
        end: i32,
    },
    FetchMissingCFiltersFinished,
    DiscoverAddressesStarted,
    DiscoverAddressesFinished,
    RescanStarted,
    RescanProgress {
        rescanned_through: i32,
    },
    RescanFinished,
    PeerConnected {
        peer_count: i32,
        addr: String,
    },
    PeerDisconnected {
        peer_count: i32,
        addr: String,
    },
}

impl From<BackendEvent> for SyncEvent {
    fn from(event: BackendEvent) -> Self {
        match event {
            BackendEvent::Synced(synced) => SyncEvent::Synced(synced),
            BackendEvent::FetchHeadersStarted => SyncEvent::FetchedHeaders {
                count: 0,
                last_header_time: 0,
                phase: Phase::Start,
            },
            BackendEvent::FetchHeadersProgress {
                fetched_headers,
                last_header_time,
            } => SyncEvent::FetchedHeaders {
                count: fetched_headers,
                last_header_time,
                phase: Phase::Progress,
            },
            BackendEvent::FetchHeadersFinished => SyncEvent::FetchedHeaders {
                count: 0,
                last_header_time: 0,
                phase: Phase::Finish,
            },
            BackendEvent::FetchMissingCFiltersStarted => SyncEvent::FetchMissingCFilters {
                start: 0,
                end: 0,
                phase: Phase::Start,
            },
            BackendEvent::FetchMissingCFiltersProgress { start, end } => {
                SyncEvent::FetchMissingCFilters {
                    start,
                    end,
                    phase: Phase::Progress,
                }
            }
            BackendEvent::FetchMissingCFiltersFinished => SyncEvent::FetchMissingCFilters {
                start: 0,
                end: 0,
                phase: Phase::Finish,
            },
            BackendEvent::DiscoverAddressesStarted => SyncEvent::DiscoveredAddresses {
                phase: Phase::Start,
            },
            BackendEvent::DiscoverAddressesFinished => SyncEvent::DiscoveredAddresses {
                phase: Phase::Finish,
            },
            BackendEvent::RescanStarted => SyncEvent::Rescan {
                through_height: 0,
                phase: Phase::Start,
            },
            BackendEvent::RescanProgress { rescanned_through } => SyncEvent::Rescan {
                through_height: rescanned_through,
                phase: Phase::Progress,
            },
            BackendEvent::RescanFinished => SyncEvent::Rescan {
                through_height: 0,
                phase: Phase::Finish,
            },
            BackendEvent::PeerConnected { peer_count, .. } => {
                SyncEvent::PeerConnected { peer_count }
            }
            BackendEvent::PeerDisconnected { peer_count, .. } => {
                SyncEvent::PeerDisconnected { peer_count }
            }
        }
    }
}
