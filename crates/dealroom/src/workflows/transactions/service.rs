use std::sync::Arc;

use tracing::info;

use super::access::resolve_role;
use super::domain::{
    Activity, ActivityKind, Milestone, TeamInvitation, TeamMember, TeamMemberStatus, Transaction,
    TransactionRecord, TransactionRole, TransactionStage,
};
use super::repository::TransactionRepository;
use crate::workflows::clock::{Clock, SystemClock};
use crate::workflows::error::{stale_as_conflict, ConflictKind, EntityKind, LifecycleError};
use crate::workflows::identity::CallerContext;
use crate::workflows::ids::{MilestoneId, PartyId, TransactionId};
use crate::workflows::notify::{dispatch, Notification, NotificationChannel, Notifier};

/// Transaction view resolved for one actor.
#[derive(Debug, Clone, serde::Serialize)]
pub struct TransactionView {
    pub role: TransactionRole,
    #[serde(flatten)]
    pub record: TransactionRecord,
    pub team: Vec<TeamMember>,
}

/// Operations on an opened transaction: schedule tracking, stage, team and history.
pub struct TransactionService<S, N> {
    store: Arc<S>,
    notifier: Arc<N>,
    clock: Arc<dyn Clock>,
}

impl<S, N> TransactionService<S, N>
where
    S: TransactionRepository + 'static,
    N: Notifier + 'static,
{
    pub fn new(store: Arc<S>, notifier: Arc<N>) -> Self {
        Self {
            store,
            notifier,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn get(
        &self,
        caller: &CallerContext,
        transaction_id: &TransactionId,
    ) -> Result<TransactionView, LifecycleError> {
        let (record, team, role) = self.authorized(caller, transaction_id)?;
        Ok(TransactionView { role, record, team })
    }

    pub fn list(&self, caller: &CallerContext) -> Result<Vec<Transaction>, LifecycleError> {
        let mut transactions = self.store.transactions_for_party(&caller.actor_id)?;
        transactions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(transactions)
    }

    pub fn complete_milestone(
        &self,
        caller: &CallerContext,
        transaction_id: &TransactionId,
        milestone_id: &MilestoneId,
    ) -> Result<Milestone, LifecycleError> {
        let (record, _, role) = self.authorized(caller, transaction_id)?;
        require_principal(role)?;

        let milestone = record
            .milestones
            .iter()
            .find(|milestone| &milestone.id == milestone_id)
            .ok_or_else(|| LifecycleError::not_found(EntityKind::Milestone, milestone_id))?;
        if milestone.completed {
            return Err(LifecycleError::invalid_state("completed", "open"));
        }

        let now = self.clock.now();
        let completed = self
            .store
            .complete_milestone(transaction_id, milestone_id, now)
            .map_err(stale_as_conflict)?;
        self.store.append_activity(Activity::record(
            transaction_id,
            ActivityKind::MilestoneCompleted,
            &caller.actor_id,
            format!("Milestone \"{}\" completed", completed.title),
            now,
        ))?;
        info!(transaction = %transaction_id, milestone = %completed.key, "milestone completed");
        Ok(completed)
    }

    /// Move the deal to a later stage. Moving backwards or sideways is a conflict.
    pub fn advance_stage(
        &self,
        caller: &CallerContext,
        transaction_id: &TransactionId,
        target: Option<TransactionStage>,
    ) -> Result<Transaction, LifecycleError> {
        let (record, _, role) = self.authorized(caller, transaction_id)?;
        require_principal(role)?;

        let mut transaction = record.transaction;
        let current = transaction.stage;
        let next = match target {
            Some(target) if target > current => target,
            Some(_) => return Err(LifecycleError::invalid_state(current.label(), "a later target stage")),
            None => current
                .next()
                .ok_or_else(|| LifecycleError::invalid_state(current.label(), "an open stage"))?,
        };

        let now = self.clock.now();
        let expected_updated_at = transaction.updated_at;
        transaction.stage = next;
        transaction.updated_at = now;
        self.store
            .update_transaction(transaction.clone(), expected_updated_at)
            .map_err(stale_as_conflict)?;
        self.store.append_activity(Activity::record(
            transaction_id,
            ActivityKind::StageAdvanced,
            &caller.actor_id,
            format!("Stage advanced from {} to {}", current.label(), next.label()),
            now,
        ))?;
        info!(transaction = %transaction_id, from = current.label(), to = next.label(), "stage advanced");

        for party in [&transaction.buyer_id, &transaction.seller_id] {
            if caller.is(party) {
                continue;
            }
            dispatch(
                self.notifier.as_ref(),
                Notification::new(party.clone(), NotificationChannel::InApp, "stage_advanced")
                    .with_detail("transaction_id", transaction_id)
                    .with_detail("stage", next.label()),
            );
        }

        Ok(transaction)
    }

    /// Seller appoints the advisor who may upload documents alongside them.
    pub fn assign_advisor(
        &self,
        caller: &CallerContext,
        transaction_id: &TransactionId,
        advisor: PartyId,
    ) -> Result<Transaction, LifecycleError> {
        let (record, _, role) = self.authorized(caller, transaction_id)?;
        if role != TransactionRole::Seller {
            return Err(LifecycleError::unauthorized("only the seller assigns an advisor"));
        }

        let mut transaction = record.transaction;
        if advisor == transaction.buyer_id || advisor == transaction.seller_id {
            return Err(LifecycleError::validation(["advisor_id"]));
        }

        let now = self.clock.now();
        let expected_updated_at = transaction.updated_at;
        transaction.advisor_id = Some(advisor.clone());
        transaction.updated_at = now;
        self.store
            .update_transaction(transaction.clone(), expected_updated_at)
            .map_err(stale_as_conflict)?;
        self.store.append_activity(Activity::record(
            transaction_id,
            ActivityKind::AdvisorAssigned,
            &caller.actor_id,
            format!("Advisor {advisor} assigned"),
            now,
        ))?;

        dispatch(
            self.notifier.as_ref(),
            Notification::new(advisor, NotificationChannel::Email, "advisor_assigned")
                .with_detail("transaction_id", transaction_id),
        );
        Ok(transaction)
    }

    pub fn invite_team_member(
        &self,
        caller: &CallerContext,
        transaction_id: &TransactionId,
        invitation: TeamInvitation,
    ) -> Result<TeamMember, LifecycleError> {
        let (record, team, role) = self.authorized(caller, transaction_id)?;
        require_principal(role)?;

        let invitee = PartyId(invitation.party_id.trim().to_string());
        if invitee.as_str().is_empty() {
            return Err(LifecycleError::validation(["party_id"]));
        }
        if record.transaction.is_party(&invitee) {
            return Err(LifecycleError::Conflict(ConflictKind::DuplicateRequest));
        }
        if team
            .iter()
            .any(|member| member.party_id == invitee && member.status != TeamMemberStatus::Declined)
        {
            return Err(LifecycleError::Conflict(ConflictKind::DuplicateRequest));
        }

        let now = self.clock.now();
        let member = self.store.upsert_team_member(TeamMember {
            transaction_id: transaction_id.clone(),
            party_id: invitee.clone(),
            title: invitation.title.filter(|title| !title.trim().is_empty()),
            invited_by: caller.actor_id.clone(),
            status: TeamMemberStatus::Invited,
            invited_at: now,
            responded_at: None,
        })?;
        self.store.append_activity(Activity::record(
            transaction_id,
            ActivityKind::TeamMemberInvited,
            &caller.actor_id,
            format!("{invitee} invited to the transaction team"),
            now,
        ))?;

        dispatch(
            self.notifier.as_ref(),
            Notification::new(invitee, NotificationChannel::Email, "team_invitation")
                .with_detail("transaction_id", transaction_id),
        );
        Ok(member)
    }

    /// The invitee accepts their own pending invitation.
    pub fn accept_invitation(
        &self,
        caller: &CallerContext,
        transaction_id: &TransactionId,
    ) -> Result<TeamMember, LifecycleError> {
        self.answer_invitation(caller, transaction_id, TeamMemberStatus::Accepted)
    }

    /// The invitee turns down their own pending invitation. They may be invited again later.
    pub fn decline_invitation(
        &self,
        caller: &CallerContext,
        transaction_id: &TransactionId,
    ) -> Result<TeamMember, LifecycleError> {
        self.answer_invitation(caller, transaction_id, TeamMemberStatus::Declined)
    }

    fn answer_invitation(
        &self,
        caller: &CallerContext,
        transaction_id: &TransactionId,
        answer: TeamMemberStatus,
    ) -> Result<TeamMember, LifecycleError> {
        self.fetch(transaction_id)?;
        let mut member = self
            .store
            .team_members(transaction_id)?
            .into_iter()
            .find(|member| caller.is(&member.party_id))
            .ok_or_else(|| LifecycleError::not_found(EntityKind::TeamMember, &caller.actor_id))?;

        if member.status != TeamMemberStatus::Invited {
            return Err(LifecycleError::invalid_state(member.status.label(), "invited"));
        }

        let now = self.clock.now();
        member.status = answer;
        member.responded_at = Some(now);
        let member = self.store.upsert_team_member(member)?;
        let (kind, description) = match answer {
            TeamMemberStatus::Declined => (
                ActivityKind::TeamMemberDeclined,
                format!("{} declined to join the transaction team", caller.actor_id),
            ),
            _ => (
                ActivityKind::TeamMemberJoined,
                format!("{} joined the transaction team", caller.actor_id),
            ),
        };
        self.store.append_activity(Activity::record(
            transaction_id,
            kind,
            &caller.actor_id,
            description,
            now,
        ))?;
        info!(transaction = %transaction_id, member = %caller.actor_id, answer = member.status.label(), "invitation answered");
        Ok(member)
    }

    pub fn activity(
        &self,
        caller: &CallerContext,
        transaction_id: &TransactionId,
    ) -> Result<Vec<Activity>, LifecycleError> {
        self.authorized(caller, transaction_id)?;
        Ok(self.store.activities(transaction_id)?)
    }

    fn fetch(&self, transaction_id: &TransactionId) -> Result<TransactionRecord, LifecycleError> {
        self.store
            .fetch_transaction(transaction_id)?
            .ok_or_else(|| LifecycleError::not_found(EntityKind::Transaction, transaction_id))
    }

    fn authorized(
        &self,
        caller: &CallerContext,
        transaction_id: &TransactionId,
    ) -> Result<(TransactionRecord, Vec<TeamMember>, TransactionRole), LifecycleError> {
        let record = self.fetch(transaction_id)?;
        let team = self.store.team_members(transaction_id)?;
        let role = resolve_role(&record.transaction, &team, &caller.actor_id).ok_or_else(|| {
            LifecycleError::unauthorized("not a participant in this transaction")
        })?;
        Ok((record, team, role))
    }
}

/// Buyer, seller and advisor drive the deal; team members only observe.
fn require_principal(role: TransactionRole) -> Result<(), LifecycleError> {
    match role {
        TransactionRole::TeamMember => Err(LifecycleError::unauthorized(
            "team members cannot change the transaction",
        )),
        _ => Ok(()),
    }
}
