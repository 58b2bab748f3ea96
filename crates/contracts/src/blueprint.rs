//! HubBlueprint - Config Loader 输出
//!
//! 描述完整的 FDIR 部署：网络地址、每类传感器的冗余组、选择策略。

use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::time::Duration;

use crate::{ContractError, CopyId, EndpointConfig, SensorKind};

/// 配置版本
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// 完整的 FDIR Hub 配置蓝图
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HubBlueprint {
    /// 配置版本
    #[serde(default)]
    pub version: ConfigVersion,

    /// 网络设置
    #[serde(default)]
    pub network: NetworkConfig,

    /// FDIR 行为设置
    #[serde(default)]
    pub fdir: FdirConfig,

    /// 冗余组列表 (每类传感器最多一个)
    #[serde(default = "default_groups")]
    pub groups: Vec<GroupConfig>,
}

impl Default for HubBlueprint {
    fn default() -> Self {
        Self {
            version: ConfigVersion::V1,
            network: NetworkConfig::default(),
            fdir: FdirConfig::default(),
            groups: default_groups(),
        }
    }
}

fn default_groups() -> Vec<GroupConfig> {
    SensorKind::ALL.iter().map(|&kind| GroupConfig::new(kind)).collect()
}

/// 网络配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// 所有端点使用的 IPv4 地址
    #[serde(default = "default_address")]
    pub address: Ipv4Addr,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
        }
    }
}

fn default_address() -> Ipv4Addr {
    Ipv4Addr::LOCALHOST
}

/// FDIR 行为配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FdirConfig {
    /// 选择策略
    #[serde(default)]
    pub selection_policy: SelectionPolicy,

    /// validity == 0 的记录视为未收到
    #[serde(default)]
    pub discard_invalid: bool,

    /// 每个 worker 的周期报告通道容量
    #[serde(default = "default_report_capacity")]
    pub report_capacity: usize,
}

impl Default for FdirConfig {
    fn default() -> Self {
        Self {
            selection_policy: SelectionPolicy::default(),
            discard_invalid: false,
            report_capacity: default_report_capacity(),
        }
    }
}

fn default_report_capacity() -> usize {
    64
}

/// Which received copy is forwarded each cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionPolicy {
    /// Forward index 0 while all expected copies report; on loss forward
    /// index `received_count` and lower the expected count for good.
    #[default]
    Sticky,
    /// Same sticky bookkeeping, but always forward the lowest-index copy
    /// that arrived this cycle.
    LowestSurviving,
}

/// 冗余组配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupConfig {
    /// 传感器类型
    pub kind: SensorKind,

    /// 冗余份数 N，1 <= N <= MAX_REDUNDANCY
    #[serde(default = "default_redundancy")]
    pub redundancy: usize,

    /// FDIR 输入端口基址 (copy i 使用 base + i)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fdir_base_port: Option<u16>,

    /// GNC 端口基址 (FDIR 输出端口；绕过 FDIR 时 copy i 使用 base + i)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gnc_port: Option<u16>,

    /// 生产者发送频率 (Hz)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency_hz: Option<f64>,

    /// 单周期接收超时 (毫秒)，缺省为两个生产者周期
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cycle_timeout_ms: Option<u64>,
}

fn default_redundancy() -> usize {
    3
}

impl GroupConfig {
    /// Triple-redundant group with the kind's default ports and rate
    pub fn new(kind: SensorKind) -> Self {
        Self {
            kind,
            redundancy: default_redundancy(),
            fdir_base_port: None,
            gnc_port: None,
            frequency_hz: None,
            cycle_timeout_ms: None,
        }
    }

    /// Set redundancy
    pub fn with_redundancy(mut self, redundancy: usize) -> Self {
        self.redundancy = redundancy;
        self
    }

    pub fn fdir_base_port(&self) -> u16 {
        self.fdir_base_port.unwrap_or(match self.kind {
            SensorKind::Imu => 50010,
            SensorKind::Gnss => 50020,
            SensorKind::StarTracker => 50030,
        })
    }

    pub fn gnc_port(&self) -> u16 {
        self.gnc_port.unwrap_or(match self.kind {
            SensorKind::Imu => 60010,
            SensorKind::Gnss => 60020,
            SensorKind::StarTracker => 60030,
        })
    }

    pub fn frequency_hz(&self) -> f64 {
        self.frequency_hz.unwrap_or(match self.kind {
            SensorKind::Imu => 1.0,
            SensorKind::Gnss => 0.5,
            SensorKind::StarTracker => 0.1,
        })
    }

    /// Receive deadline of one FDIR cycle
    ///
    /// Defaults to two producer periods, saturating at `Duration::MAX` for
    /// rates too low to represent.
    pub fn cycle_timeout(&self) -> Duration {
        match self.cycle_timeout_ms {
            Some(ms) => Duration::from_millis(ms),
            None => {
                Duration::try_from_secs_f64(2.0 / self.frequency_hz()).unwrap_or(Duration::MAX)
            }
        }
    }

    /// FDIR input port of copy `index`
    pub fn fdir_port(&self, index: usize) -> Option<u16> {
        offset_port(self.fdir_base_port(), index)
    }

    /// Nominal (direct-to-GNC) port of copy `index`
    pub fn nominal_port(&self, index: usize) -> Option<u16> {
        offset_port(self.gnc_port(), index)
    }
}

fn offset_port(base: u16, index: usize) -> Option<u16> {
    u16::try_from(index).ok().and_then(|i| base.checked_add(i))
}

impl HubBlueprint {
    /// Find the group of a sensor kind
    pub fn group(&self, kind: SensorKind) -> Option<&GroupConfig> {
        self.groups.iter().find(|g| g.kind == kind)
    }

    fn require_group(&self, kind: SensorKind) -> Result<&GroupConfig, ContractError> {
        self.group(kind).ok_or_else(|| {
            ContractError::config_validation(
                format!("groups[kind={kind}]"),
                "no redundancy group configured for this sensor kind",
            )
        })
    }

    fn socket_addr(&self, port: u16) -> SocketAddr {
        SocketAddr::V4(SocketAddrV4::new(self.network.address, port))
    }

    /// FDIR input endpoints of a kind, ordered by copy index
    pub fn input_endpoints(&self, kind: SensorKind) -> Result<Vec<EndpointConfig>, ContractError> {
        let group = self.require_group(kind)?;
        (0..group.redundancy)
            .map(|index| {
                let port = group.fdir_port(index).ok_or_else(|| {
                    ContractError::config_validation(
                        format!("groups[kind={kind}].fdir_base_port"),
                        "port range overflows u16",
                    )
                })?;
                Ok(EndpointConfig::input(
                    CopyId::new(kind, index).to_string(),
                    self.socket_addr(port),
                ))
            })
            .collect()
    }

    /// FDIR output endpoint of a kind (destination is the GNC port)
    pub fn output_endpoint(&self, kind: SensorKind) -> Result<EndpointConfig, ContractError> {
        let group = self.require_group(kind)?;
        Ok(EndpointConfig::output(
            format!("{kind}->gnc"),
            self.socket_addr(group.gnc_port()),
        ))
    }

    /// GNC-side input endpoint of a kind
    pub fn gnc_endpoint(&self, kind: SensorKind) -> Result<EndpointConfig, ContractError> {
        let group = self.require_group(kind)?;
        Ok(EndpointConfig::input(
            format!("gnc<-{kind}"),
            self.socket_addr(group.gnc_port()),
        ))
    }

    /// Where producer copies of a kind send: the FDIR port set, or the
    /// nominal port set when FDIR is bypassed
    pub fn producer_targets(
        &self,
        kind: SensorKind,
        bypass_fdir: bool,
    ) -> Result<Vec<SocketAddr>, ContractError> {
        let group = self.require_group(kind)?;
        (0..group.redundancy)
            .map(|index| {
                let port = if bypass_fdir {
                    group.nominal_port(index)
                } else {
                    group.fdir_port(index)
                };
                port.map(|p| self.socket_addr(p)).ok_or_else(|| {
                    ContractError::config_validation(
                        format!("groups[kind={kind}]"),
                        "port range overflows u16",
                    )
                })
            })
            .collect()
    }
}
