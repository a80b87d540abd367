// RouterOS API command paths used by this service

pub const IP_ADDRESSES: &str = "/ip/address/print";
pub const DHCP_LEASES: &str = "/ip/dhcp-server/lease/print";
pub const INTERFACES: &str = "/interface/print";
pub const MONITOR_TRAFFIC: &str = "/interface/monitor-traffic";
pub const HOTSPOT_USERS: &str = "/ip/hotspot/user/print";
pub const HOTSPOT_ACTIVE: &str = "/ip/hotspot/active/print";
pub const HOTSPOT_HOSTS: &str = "/ip/hotspot/host/print";
pub const HOTSPOT_USER_SET: &str = "/ip/hotspot/user/set";
pub const HOTSPOT_USER_REMOVE: &str = "/ip/hotspot/user/remove";
pub const LOG: &str = "/log/print";
