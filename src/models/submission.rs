use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::utils::error::{AppError, AppResult};

/// 谱面投稿的总体状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubmissionStatus {
    Pending,
    /// 志愿者审核已通过，等待准入审核
    VolunteerApproved,
    Approved,
    Rejected,
}

impl SubmissionStatus {
    /// 终态之后投票不再改变状态，重新投稿需要新建投稿
    pub fn is_terminal(&self) -> bool {
        matches!(self, SubmissionStatus::Approved | SubmissionStatus::Rejected)
    }
}

/// 与志愿者审核相互独立的准入审核
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdmissionStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSubmission {
    pub id: Uuid,
    pub status: SubmissionStatus,
    pub admission_status: AdmissionStatus,
    /// 最近一次内容更新时间，早于它的志愿者投票不计入
    pub date_updated: DateTime<Utc>,
}

impl ChartSubmission {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            status: SubmissionStatus::Pending,
            admission_status: AdmissionStatus::Pending,
            date_updated: Utc::now(),
        }
    }
}

impl ChartSubmission {
    fn ensure_open(&self) -> AppResult<()> {
        if self.status.is_terminal() {
            return Err(AppError::InvalidState(format!(
                "投稿 {} 已处于终态 {:?}",
                self.id, self.status
            )));
        }
        Ok(())
    }

    /// 准入审核通过。志愿者审核已通过时投稿随之通过
    pub fn approve_admission(&mut self) -> AppResult<()> {
        self.ensure_open()?;
        self.admission_status = AdmissionStatus::Approved;
        if self.status == SubmissionStatus::VolunteerApproved {
            self.status = SubmissionStatus::Approved;
        }
        Ok(())
    }

    /// 准入审核拒绝，投稿直接进入终态
    pub fn reject_admission(&mut self) -> AppResult<()> {
        self.ensure_open()?;
        self.admission_status = AdmissionStatus::Rejected;
        self.status = SubmissionStatus::Rejected;
        Ok(())
    }

    /// 投稿内容更新后，之前的志愿者投票全部作废，已通过的志愿者审核需要重新进行
    pub fn mark_content_updated(&mut self) -> AppResult<()> {
        self.ensure_open()?;
        self.date_updated = Utc::now();
        if self.status == SubmissionStatus::VolunteerApproved {
            log::info!("投稿[{}]内容已更新，志愿者审核重新开始", self.id);
            self.status = SubmissionStatus::Pending;
        }
        Ok(())
    }
}

impl Default for ChartSubmission {
    fn default() -> Self {
        Self::new()
    }
}

/// 志愿者投票，分数取 -1（不通过）、0（中立）或 1（通过）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolunteerVote {
    pub id: Uuid,
    pub submission_id: Uuid,
    pub owner_id: i32,
    pub score: i32,
    pub date_created: DateTime<Utc>,
}

impl VolunteerVote {
    pub fn new(submission_id: Uuid, owner_id: i32, score: i32) -> AppResult<Self> {
        if !(-1..=1).contains(&score) {
            return Err(AppError::ValidationError(format!(
                "志愿者投票分数 {score} 只能为 -1、0 或 1"
            )));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            submission_id,
            owner_id,
            score,
            date_created: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admission_completes_volunteer_approval() {
        let mut submission = ChartSubmission::new();
        submission.approve_admission().unwrap();
        assert_eq!(submission.status, SubmissionStatus::Pending);

        submission.status = SubmissionStatus::VolunteerApproved;
        submission.approve_admission().unwrap();
        assert_eq!(submission.status, SubmissionStatus::Approved);
        assert!(matches!(
            submission.reject_admission(),
            Err(AppError::InvalidState(_))
        ));
    }

    #[test]
    fn admission_rejection_is_terminal() {
        let mut submission = ChartSubmission::new();
        submission.reject_admission().unwrap();
        assert_eq!(submission.status, SubmissionStatus::Rejected);
        assert_eq!(submission.admission_status, AdmissionStatus::Rejected);
        assert!(submission.mark_content_updated().is_err());
        assert!(submission.approve_admission().is_err());
    }

    #[test]
    fn volunteer_vote_score_range() {
        let id = Uuid::new_v4();
        assert!(VolunteerVote::new(id, 1, -1).is_ok());
        assert!(VolunteerVote::new(id, 1, 1).is_ok());
        assert!(matches!(
            VolunteerVote::new(id, 1, 2),
            Err(AppError::ValidationError(_))
        ));
    }
}
