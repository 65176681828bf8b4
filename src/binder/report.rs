//! # 处理结果与上报事件

use serde::Serialize;

/// 控件当前的处理状态。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionState {
    Idle,
    Processing,
}

/// 单次选择处理的结果。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionOutcome {
    /// 空选择，未做任何处理。
    Empty,
    /// 已提交重建后的文件列表。
    Committed {
        generation: u64,
        file_count: usize,
        bytes_before: u64,
        bytes_after: u64,
    },
    /// 处理期间出现了更新的选择，本次结果被丢弃。
    Superseded { generation: u64, latest_generation: u64 },
}

/// 推送给订阅方的事件。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SelectionReport {
    Committed {
        target_id: String,
        generation: u64,
        file_count: usize,
        bytes_before: u64,
        bytes_after: u64,
    },
    Superseded {
        target_id: String,
        generation: u64,
        latest_generation: u64,
    },
    Failed {
        target_id: String,
        generation: u64,
        error: String,
    },
}

impl SelectionReport {
    pub fn target_id(&self) -> &str {
        match self {
            Self::Committed { target_id, .. }
            | Self::Superseded { target_id, .. }
            | Self::Failed { target_id, .. } => target_id,
        }
    }

    pub fn generation(&self) -> u64 {
        match self {
            Self::Committed { generation, .. }
            | Self::Superseded { generation, .. }
            | Self::Failed { generation, .. } => *generation,
        }
    }
}
