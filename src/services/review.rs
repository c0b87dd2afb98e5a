use crate::models::submission::{AdmissionStatus, ChartSubmission, SubmissionStatus, VolunteerVote};

/// 按有效票数给出的 (拒绝下界, 通过下界)，票数超过最后一档时沿用最后一档
const REVIEW_BOUNDS: [(usize, f64, f64); 4] = [
    (2, -0.99, 0.99),
    (3, -0.66, 0.66),
    (4, -0.49, 0.5),
    (5, -0.39, 0.4),
];

/// 票数不足时返回 None
pub fn review_bounds(vote_count: usize) -> Option<(f64, f64)> {
    REVIEW_BOUNDS
        .iter()
        .rev()
        .find(|(count, _, _)| vote_count >= *count)
        .map(|&(_, reject_below, approve_at)| (reject_below, approve_at))
}

/// 只统计投给该投稿、且在最近一次内容更新之后投出的票
pub fn qualifying_votes<'a>(
    submission: &'a ChartSubmission,
    votes: &'a [VolunteerVote],
) -> impl Iterator<Item = &'a VolunteerVote> + 'a {
    votes.iter().filter(move |vote| {
        vote.submission_id == submission.id && vote.date_created > submission.date_updated
    })
}

/// 根据志愿者投票计算投稿的下一个状态，不修改投稿
pub fn evaluate(submission: &ChartSubmission, votes: &[VolunteerVote]) -> SubmissionStatus {
    if submission.status != SubmissionStatus::Pending {
        return submission.status;
    }

    let (count, sum) = qualifying_votes(submission, votes)
        .fold((0usize, 0i64), |(count, sum), vote| (count + 1, sum + vote.score as i64));
    let Some((reject_below, approve_at)) = review_bounds(count) else {
        return submission.status;
    };

    let average = sum as f64 / count as f64;
    if average < reject_below {
        SubmissionStatus::Rejected
    } else if average >= approve_at {
        if submission.admission_status == AdmissionStatus::Approved {
            SubmissionStatus::Approved
        } else {
            SubmissionStatus::VolunteerApproved
        }
    } else {
        SubmissionStatus::Pending
    }
}

/// 应用志愿者投票结果，返回状态是否变化
pub fn apply_votes(submission: &mut ChartSubmission, votes: &[VolunteerVote]) -> bool {
    let next = evaluate(submission, votes);
    if next == submission.status {
        return false;
    }
    log::info!("投稿[{}]状态变更: {:?} -> {:?}", submission.id, submission.status, next);
    submission.status = next;
    true
}
