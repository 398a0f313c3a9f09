// Network interface traffic model

use serde::Serialize;

/// Cumulative traffic of one interface, in KB.
#[derive(Debug, Clone, Serialize)]
pub struct InterfaceTraffic {
    pub kb_received: u64,
    pub kb_transmitted: u64,
}
