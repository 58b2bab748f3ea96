//! Producer 错误类型

use contracts::{ContractError, SensorKind};
use thiserror::Error;
use transport::TransportError;

/// 周期调度错误
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchedulerError {
    /// 频率必须为有限正数
    #[error("invalid frequency {0} Hz: must be finite and > 0")]
    InvalidFrequency(f64),
}

/// Producer 错误
#[derive(Debug, Error)]
pub enum ProducerError {
    /// 调度参数非法
    #[error("{kind}: {source}")]
    Scheduler {
        /// 传感器类型
        kind: SensorKind,
        #[source]
        source: SchedulerError,
    },

    /// 发送端点打开失败
    #[error("{kind}: {source}")]
    Transport {
        /// 传感器类型
        kind: SensorKind,
        #[source]
        source: TransportError,
    },

    /// 配置缺失或非法
    #[error(transparent)]
    Config(#[from] ContractError),

    /// 没有任何发送目标
    #[error("{kind}: producer has no targets")]
    NoTargets {
        /// 传感器类型
        kind: SensorKind,
    },
}

/// Producer Result 类型别名
pub type Result<T> = std::result::Result<T, ProducerError>;
