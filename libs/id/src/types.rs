//! Typed identifier definitions for control-plane resources.

use crate::define_id;

define_id!(ContainerId, "ctr");
define_id!(HostId, "host");
define_id!(FlavorId, "flv");
define_id!(RequestId, "req");
