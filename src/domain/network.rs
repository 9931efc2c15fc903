// Copyright (c) 2025 - Cowboy AI, Inc.
//! Network Value Objects with Validation Invariants

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;
use thiserror::Error;

/// Network validation error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NetworkError {
    #[error("Invalid IP address format: {0}")]
    InvalidIpAddress(String),

    #[error("Invalid CIDR notation: {0}")]
    InvalidCidr(String),

    #[error("Invalid prefix length: {0} (must be 0-32)")]
    InvalidPrefixLength(u8),

    #[error("CIDR {0} has host bits set")]
    HostBitsSet(String),

    #[error("Cannot split {block} into {count} subnets of at least /{min_prefix}")]
    InsufficientAddressSpace {
        block: String,
        count: usize,
        min_prefix: u8,
    },

    #[error("Invalid port: {0} (must be 1-65535)")]
    InvalidPort(u16),

    #[error("Invalid availability zone count: {0} (must be 1-6)")]
    InvalidZoneCount(u8),
}

/// IPv4 CIDR block
///
/// # Invariants
/// - Prefix length 0-32
/// - No host bits set below the prefix
///
/// ```rust
/// use cim_cloud_stacks::domain::CidrBlock;
///
/// let vpc = CidrBlock::new("10.0.0.0/16").unwrap();
/// let subnets = vpc.split(6).unwrap();
/// assert_eq!(subnets[1].to_string(), "10.0.32.0/19");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CidrBlock {
    address: Ipv4Addr,
    prefix_len: u8,
}

impl CidrBlock {
    /// Smallest subnet the provider accepts
    pub const MAX_SUBNET_PREFIX: u8 = 28;

    /// Address space of an owned network unless configured otherwise
    pub const DEFAULT_VPC: CidrBlock = CidrBlock {
        address: Ipv4Addr::new(10, 0, 0, 0),
        prefix_len: 16,
    };

    pub fn new(cidr: impl AsRef<str>) -> Result<Self, NetworkError> {
        let cidr = cidr.as_ref();

        let (addr_str, prefix_str) = cidr
            .split_once('/')
            .ok_or_else(|| NetworkError::InvalidCidr(cidr.to_string()))?;

        let address = Ipv4Addr::from_str(addr_str)
            .map_err(|_| NetworkError::InvalidIpAddress(addr_str.to_string()))?;

        let prefix_len = prefix_str
            .parse::<u8>()
            .map_err(|_| NetworkError::InvalidCidr(cidr.to_string()))?;

        Self::from_parts(address, prefix_len)
    }

    pub fn from_parts(address: Ipv4Addr, prefix_len: u8) -> Result<Self, NetworkError> {
        if prefix_len > 32 {
            return Err(NetworkError::InvalidPrefixLength(prefix_len));
        }

        if u32::from(address) & !Self::mask(prefix_len) != 0 {
            return Err(NetworkError::HostBitsSet(format!("{}/{}", address, prefix_len)));
        }

        Ok(Self {
            address,
            prefix_len,
        })
    }

    /// The whole IPv4 space, `0.0.0.0/0`
    pub fn any_ipv4() -> Self {
        Self {
            address: Ipv4Addr::UNSPECIFIED,
            prefix_len: 0,
        }
    }

    /// A single host, `/32`
    pub fn host(address: Ipv4Addr) -> Self {
        Self {
            address,
            prefix_len: 32,
        }
    }

    pub fn address(&self) -> Ipv4Addr {
        self.address
    }

    pub fn prefix_len(&self) -> u8 {
        self.prefix_len
    }

    /// Number of addresses in the block
    pub fn size(&self) -> u64 {
        1u64 << (32 - self.prefix_len)
    }

    /// Check whether `other` lies entirely inside this block
    pub fn contains(&self, other: &CidrBlock) -> bool {
        other.prefix_len >= self.prefix_len
            && u32::from(other.address) & Self::mask(self.prefix_len) == u32::from(self.address)
    }

    /// Split into `count` equally sized consecutive blocks
    ///
    /// The new prefix is the smallest that fits `count` blocks; unused
    /// trailing space is left unallocated.
    pub fn split(&self, count: usize) -> Result<Vec<CidrBlock>, NetworkError> {
        if count == 0 {
            return Ok(Vec::new());
        }

        let extra_bits = usize::BITS - (count - 1).leading_zeros();
        let new_prefix = u32::from(self.prefix_len) + extra_bits;
        if new_prefix > u32::from(Self::MAX_SUBNET_PREFIX) {
            return Err(NetworkError::InsufficientAddressSpace {
                block: self.to_string(),
                count,
                min_prefix: Self::MAX_SUBNET_PREFIX,
            });
        }

        let step = 1u64 << (32 - new_prefix);
        let base = u64::from(u32::from(self.address));
        let new_prefix = new_prefix as u8;

        Ok((0..count as u64)
            .map(|i| CidrBlock {
                address: Ipv4Addr::from((base + i * step) as u32),
                prefix_len: new_prefix,
            })
            .collect())
    }

    fn mask(prefix_len: u8) -> u32 {
        if prefix_len == 0 {
            0
        } else {
            u32::MAX << (32 - u32::from(prefix_len))
        }
    }
}

impl fmt::Display for CidrBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.address, self.prefix_len)
    }
}

impl FromStr for CidrBlock {
    type Err = NetworkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for CidrBlock {
    type Error = NetworkError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CidrBlock> for String {
    fn from(value: CidrBlock) -> Self {
        value.to_string()
    }
}

/// IP protocol of a firewall rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IpProtocol {
    Tcp,
    Udp,
    /// Every protocol, rendered as `-1`
    All,
}

impl IpProtocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tcp => "tcp",
            Self::Udp => "udp",
            Self::All => "-1",
        }
    }
}

impl fmt::Display for IpProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Protocol plus port range of a firewall rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Port {
    protocol: IpProtocol,
    from_port: Option<u16>,
    to_port: Option<u16>,
}

impl Port {
    /// A single TCP port
    pub fn tcp(port: u16) -> Result<Self, NetworkError> {
        Self::single(IpProtocol::Tcp, port)
    }

    /// A single UDP port
    pub fn udp(port: u16) -> Result<Self, NetworkError> {
        Self::single(IpProtocol::Udp, port)
    }

    /// All traffic on all ports
    pub fn all_traffic() -> Self {
        Self {
            protocol: IpProtocol::All,
            from_port: None,
            to_port: None,
        }
    }

    fn single(protocol: IpProtocol, port: u16) -> Result<Self, NetworkError> {
        if port == 0 {
            return Err(NetworkError::InvalidPort(port));
        }
        Ok(Self {
            protocol,
            from_port: Some(port),
            to_port: Some(port),
        })
    }

    pub fn protocol(&self) -> IpProtocol {
        self.protocol
    }

    pub fn from_port(&self) -> Option<u16> {
        self.from_port
    }

    pub fn to_port(&self) -> Option<u16> {
        self.to_port
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.from_port, self.to_port) {
            (Some(from), Some(to)) if from == to => {
                write!(f, "{} {}", self.protocol.as_str().to_uppercase(), from)
            }
            (Some(from), Some(to)) => write!(
                f,
                "{} {}-{}",
                self.protocol.as_str().to_uppercase(),
                from,
                to
            ),
            _ => write!(f, "ALL TRAFFIC"),
        }
    }
}

/// Role of a subnet group inside a network
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubnetType {
    /// Routed through the internet gateway; instances may get public IPs
    Public,
    /// Outbound internet through a NAT gateway, no inbound
    PrivateWithEgress,
    /// No route to the internet
    PrivateIsolated,
}

impl SubnetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Public => "Public",
            Self::PrivateWithEgress => "Private",
            Self::PrivateIsolated => "Isolated",
        }
    }
}

impl fmt::Display for SubnetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Number of availability zones a network spans
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct ZoneCount(u8);

impl ZoneCount {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 6;

    pub fn new(count: u8) -> Result<Self, NetworkError> {
        if !(Self::MIN..=Self::MAX).contains(&count) {
            return Err(NetworkError::InvalidZoneCount(count));
        }
        Ok(Self(count))
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

impl Default for ZoneCount {
    fn default() -> Self {
        Self(3)
    }
}

impl TryFrom<u8> for ZoneCount {
    type Error = NetworkError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ZoneCount> for u8 {
    fn from(value: ZoneCount) -> Self {
        value.0
    }
}
