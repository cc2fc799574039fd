//! # Drive stack messages
//!
//! Messages published and subscribed to by the planning and control core.
//! All messages are serialisable so that they can be carried by whatever
//! transport the stack is deployed with.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

pub mod dbw;
pub mod lane;
pub mod light;
pub mod pose;

// ------------------------------------------------------------------------------------------------
// EXPORTS
// ------------------------------------------------------------------------------------------------

pub use dbw::{SteeringCmd, TwistCmd};
pub use lane::{LaneMsg, WaypointMsg};
pub use light::{
    Detection, LightColor, TrafficWaypoint, CLASS_ID_GREEN, CLASS_ID_RED, CLASS_ID_YELLOW,
};
pub use pose::PoseMsg;

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_class_ids_map_to_colors() {
        assert_eq!(LightColor::from_class_id(CLASS_ID_GREEN), LightColor::Green);
        assert_eq!(LightColor::from_class_id(CLASS_ID_RED), LightColor::Red);
        assert_eq!(LightColor::from_class_id(CLASS_ID_YELLOW), LightColor::Yellow);
    }
}
