//! 配置校验模块
//!
//! 校验规则：
//! - 每类传感器最多一个冗余组
//! - 1 <= redundancy <= MAX_REDUNDANCY
//! - frequency_hz > 0，且两个周期可表示为 Duration
//! - 端口范围不溢出，且各组端口互不冲突
//! - cycle_timeout_ms / report_capacity > 0

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use contracts::{ContractError, GroupConfig, HubBlueprint, MAX_REDUNDANCY};

/// 校验 HubBlueprint 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(blueprint: &HubBlueprint) -> Result<(), ContractError> {
    validate_unique_kinds(blueprint)?;
    for group in &blueprint.groups {
        validate_redundancy(group)?;
        validate_frequency(group)?;
        validate_cycle_timeout(group)?;
    }
    validate_ports(blueprint)?;
    validate_fdir(blueprint)?;
    Ok(())
}

/// 校验传感器类型唯一性
fn validate_unique_kinds(blueprint: &HubBlueprint) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for group in &blueprint.groups {
        if !seen.insert(group.kind) {
            return Err(ContractError::config_validation(
                format!("groups[kind={}]", group.kind),
                "duplicate redundancy group for sensor kind",
            ));
        }
    }
    Ok(())
}

/// 校验冗余份数 (不截断，直接报错)
fn validate_redundancy(group: &GroupConfig) -> Result<(), ContractError> {
    if group.redundancy == 0 || group.redundancy > MAX_REDUNDANCY {
        return Err(ContractError::config_validation(
            format!("groups[kind={}].redundancy", group.kind),
            format!(
                "redundancy must be within 1..={MAX_REDUNDANCY}, got {}",
                group.redundancy
            ),
        ));
    }
    Ok(())
}

/// 校验生产者频率
fn validate_frequency(group: &GroupConfig) -> Result<(), ContractError> {
    let hz = group.frequency_hz();
    if !hz.is_finite() || hz <= 0.0 {
        return Err(ContractError::config_validation(
            format!("groups[kind={}].frequency_hz", group.kind),
            format!("frequency_hz must be > 0, got {hz}"),
        ));
    }
    // 默认周期超时为两个周期，必须能表示为 Duration
    if Duration::try_from_secs_f64(2.0 / hz).is_err() {
        return Err(ContractError::config_validation(
            format!("groups[kind={}].frequency_hz", group.kind),
            format!("frequency_hz {hz} is too low, cycle timeout would overflow"),
        ));
    }
    Ok(())
}

fn validate_cycle_timeout(group: &GroupConfig) -> Result<(), ContractError> {
    if group.cycle_timeout_ms == Some(0) {
        return Err(ContractError::config_validation(
            format!("groups[kind={}].cycle_timeout_ms", group.kind),
            "cycle_timeout_ms must be > 0",
        ));
    }
    Ok(())
}

/// 校验端口：范围不溢出，FDIR 输入 / GNC 名义端口全局不冲突
fn validate_ports(blueprint: &HubBlueprint) -> Result<(), ContractError> {
    let mut owners: HashMap<u16, String> = HashMap::new();

    for group in &blueprint.groups {
        for index in 0..group.redundancy {
            let fdir = group.fdir_port(index).ok_or_else(|| {
                ContractError::config_validation(
                    format!("groups[kind={}].fdir_base_port", group.kind),
                    "fdir port range overflows u16",
                )
            })?;
            let nominal = group.nominal_port(index).ok_or_else(|| {
                ContractError::config_validation(
                    format!("groups[kind={}].gnc_port", group.kind),
                    "nominal port range overflows u16",
                )
            })?;

            claim_port(&mut owners, fdir, format!("{}.fdir[{index}]", group.kind))?;
            claim_port(&mut owners, nominal, format!("{}.gnc[{index}]", group.kind))?;
        }
    }
    Ok(())
}

fn claim_port(
    owners: &mut HashMap<u16, String>,
    port: u16,
    owner: String,
) -> Result<(), ContractError> {
    if let Some(existing) = owners.get(&port) {
        return Err(ContractError::config_validation(
            owner.clone(),
            format!("port {port} already used by {existing}"),
        ));
    }
    owners.insert(port, owner);
    Ok(())
}

fn validate_fdir(blueprint: &HubBlueprint) -> Result<(), ContractError> {
    if blueprint.fdir.report_capacity == 0 {
        return Err(ContractError::config_validation(
            "fdir.report_capacity",
            "report_capacity must be > 0",
        ));
    }
    Ok(())
}
