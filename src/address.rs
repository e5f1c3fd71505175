//! Address plan for the shared cluster network.
//!
//! All nodes on the `Network` link live in one /24. Host number 0 is the
//! network address and 255 the broadcast address, so usable hosts are
//! `1..=254`.

use std::net::Ipv4Addr;

use crate::error::{ProfileError, Result};

const DEFAULT_BASE: Ipv4Addr = Ipv4Addr::new(192, 168, 1, 0);
const NETMASK: Ipv4Addr = Ipv4Addr::new(255, 255, 255, 0);
const LAST_HOST: u32 = 254;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClusterSubnet {
    base: Ipv4Addr,
}

impl Default for ClusterSubnet {
    fn default() -> Self {
        Self { base: DEFAULT_BASE }
    }
}

impl ClusterSubnet {
    pub fn netmask(&self) -> Ipv4Addr {
        NETMASK
    }

    /// Number of assignable host addresses
    pub fn capacity(&self) -> u32 {
        LAST_HOST
    }

    /// Address of the `slot`-th host, counting from zero at `.1`.
    pub fn host(&self, slot: u32) -> Result<Ipv4Addr> {
        let host = slot
            .checked_add(1)
            .filter(|h| *h <= LAST_HOST)
            .ok_or_else(|| {
                ProfileError::address(format!(
                    "slot {} is outside {}/24 (at most {} hosts)",
                    slot, self.base, LAST_HOST
                ))
            })?;
        Ok(Ipv4Addr::from(u32::from(self.base) | host))
    }
}
