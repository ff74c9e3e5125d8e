//! Particle status codes in the Les Houches convention

/// Incoming particle
pub const INCOMING: i32 = -1;
/// Outgoing final state particle
pub const OUTGOING: i32 = 1;
/// Stable final state particle, the only status entering the rapidity gap search
pub const FINAL_STATE: i32 = OUTGOING;
/// Incoming beam particles at time t = −∞
pub const INCOMING_BEAM: i32 = -9;

/// Whether a particle with the given status enters the diffractive
/// system reconstruction
pub fn is_final_state(status: i32) -> bool {
    status == FINAL_STATE
}
