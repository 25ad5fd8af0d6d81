use std::collections::HashSet;

use chrono::Utc;
use sea_orm::{
    Condition, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
    sea_query::Expr,
};
use uuid::Uuid;

use crate::{
    BankDepositCmd, CashHandover, ConfirmHandoverCmd, CreateHandoverCmd, EngineError,
    HandoverStatus, HandoverType, MoneyCents, ResolveDisputeCmd, ResultEngine, Role, Shift,
    ShiftStatus, handovers, variance,
};

use super::{
    Actor, Engine, normalize_optional_text, require_transition, unique_violation, with_tx,
};

impl Engine {
    /// Opens a new pending leg of the custody chain.
    ///
    /// Shift collections root a chain on an ended shift's counted cash; every
    /// other type carries forward the settled amount of its predecessor.
    pub async fn create_handover(
        &self,
        actor: &Actor,
        cmd: CreateHandoverCmd,
    ) -> ResultEngine<CashHandover> {
        match cmd.handover_type {
            HandoverType::ShiftCollection | HandoverType::EmployeeToManager => {
                actor.require_min_role(Role::Manager)?;
            }
            HandoverType::ManagerToOwner => actor.require_min_role(Role::Manager)?,
            HandoverType::DepositToBank => actor.require_min_role(Role::Owner)?,
        }

        with_tx!(self, |db_tx| {
            let (station_id, shift_id, previous, expected, from_user_id) =
                match cmd.handover_type {
                    HandoverType::ShiftCollection => {
                        let shift_id = cmd.shift_id.ok_or_else(|| {
                            EngineError::Validation(
                                "shift collection requires a shift id".to_string(),
                            )
                        })?;
                        let shift = self.require_shift(&db_tx, shift_id).await?;
                        self.require_station_access(&db_tx, actor, &shift.station_id)
                            .await?;
                        let expected = collectable_cash(&shift)?;
                        let from = cmd.from_user_id.unwrap_or_else(|| shift.employee_id.clone());
                        (shift.station_id, Some(shift.id), None, expected, Some(from))
                    }
                    _ => {
                        let previous_id = cmd.previous_handover_id.ok_or_else(|| {
                            EngineError::Validation(format!(
                                "{} requires a previous handover",
                                cmd.handover_type.as_str()
                            ))
                        })?;
                        let previous = self.require_handover(&db_tx, previous_id).await?;
                        self.require_station_access(&db_tx, actor, &previous.station_id)
                            .await?;
                        let expected = settled_amount(&previous)?;
                        let from = cmd.from_user_id.unwrap_or_else(|| actor.username.clone());
                        if cmd.handover_type == HandoverType::ManagerToOwner {
                            let sender = self.require_user_exists(&db_tx, &from).await?;
                            if !Role::try_from(sender.role.as_str())?.has_min_role(Role::Manager) {
                                return Err(EngineError::BusinessRule(format!(
                                    "user {from} must hold manager role or above to hand over \
                                     to the owner"
                                )));
                            }
                        }
                        (
                            previous.station_id,
                            None,
                            Some(previous.id),
                            expected,
                            Some(from),
                        )
                    }
                };

            if let Some(shift_id) = shift_id {
                let existing_root = handovers::Entity::find()
                    .filter(handovers::Column::ShiftId.eq(shift_id.to_string()))
                    .filter(
                        handovers::Column::HandoverType
                            .eq(HandoverType::ShiftCollection.as_str()),
                    )
                    .one(&db_tx)
                    .await?;
                if existing_root.is_some() {
                    return Err(EngineError::Conflict(format!(
                        "shift {shift_id} already has a collection handover"
                    )));
                }
            }

            if let Some(to_user_id) = cmd.to_user_id.as_deref() {
                self.require_user_exists(&db_tx, to_user_id).await?;
            }

            let mut handover = CashHandover::new(
                station_id,
                cmd.handover_type,
                from_user_id,
                expected,
                Utc::now(),
            );
            handover.shift_id = shift_id;
            handover.previous_handover_id = previous;
            handover.to_user_id = cmd.to_user_id;
            handover.notes = normalize_optional_text(cmd.notes.as_deref());
            // The partial unique index on collection roots backs this up
            // against a racing inserter.
            handovers::ActiveModel::from(&handover)
                .insert(&db_tx)
                .await
                .map_err(|err| unique_violation(err, "shift already has a collection handover"))?;
            Ok(handover)
        })
    }

    /// Counts a pending handover. Within tolerance the leg settles as
    /// confirmed; beyond it the leg is marked disputed and blocked as a
    /// predecessor until resolved.
    ///
    /// The transition happens exactly once: the update is guarded on
    /// `status = pending` and a losing racer gets a conflict.
    pub async fn confirm_handover(
        &self,
        actor: &Actor,
        cmd: ConfirmHandoverCmd,
    ) -> ResultEngine<CashHandover> {
        with_tx!(self, |db_tx| {
            let handover = self.require_handover(&db_tx, cmd.handover_id).await?;
            if handover.status != HandoverStatus::Pending {
                return Err(EngineError::InvalidState(format!(
                    "handover is {}, not pending",
                    handover.status.as_str()
                )));
            }
            self.require_recipient(&db_tx, actor, &handover).await?;

            let difference = variance(handover.expected_amount, cmd.actual_amount);
            let accepted = self
                .tolerance()
                .within(difference, handover.expected_amount);
            let now = Utc::now();
            let notes = normalize_optional_text(cmd.notes.as_deref());

            let mut update = handovers::Entity::update_many()
                .col_expr(
                    handovers::Column::ActualAmountMinor,
                    Expr::value(cmd.actual_amount.minor()),
                )
                .col_expr(
                    handovers::Column::DifferenceMinor,
                    Expr::value(difference.minor()),
                );
            // An undesignated leg binds to whoever counted it; a designated
            // recipient stays on record even when an owner overrides.
            if handover.to_user_id.is_none() {
                update = update.col_expr(
                    handovers::Column::ToUserId,
                    Expr::value(actor.username.clone()),
                );
            }
            if accepted {
                update = update
                    .col_expr(
                        handovers::Column::Status,
                        Expr::value(HandoverStatus::Confirmed.as_str()),
                    )
                    .col_expr(handovers::Column::ConfirmedAt, Expr::value(now))
                    .col_expr(
                        handovers::Column::ConfirmedBy,
                        Expr::value(actor.username.clone()),
                    );
                if notes.is_some() {
                    update = update.col_expr(handovers::Column::Notes, Expr::value(notes));
                }
            } else {
                update = update
                    .col_expr(
                        handovers::Column::Status,
                        Expr::value(HandoverStatus::Disputed.as_str()),
                    )
                    .col_expr(handovers::Column::DisputeNotes, Expr::value(notes));
            }

            let result = update
                .filter(handovers::Column::Id.eq(handover.id.to_string()))
                .filter(handovers::Column::Status.eq(HandoverStatus::Pending.as_str()))
                .exec(&db_tx)
                .await?;
            require_transition(result, "handover was confirmed concurrently")?;

            self.require_handover(&db_tx, handover.id).await
        })
    }

    /// Settles a disputed handover. Owner and above; terminal. An adjusted
    /// amount, when given, becomes the figure successors carry forward, and
    /// the resolving owner is stamped as the confirming authority.
    pub async fn resolve_dispute(
        &self,
        actor: &Actor,
        cmd: ResolveDisputeCmd,
    ) -> ResultEngine<CashHandover> {
        actor.require_min_role(Role::Owner)?;
        let resolution_notes = cmd.resolution_notes.trim().to_string();
        if resolution_notes.is_empty() {
            return Err(EngineError::Validation(
                "resolution notes must not be empty".to_string(),
            ));
        }

        with_tx!(self, |db_tx| {
            let handover = self.require_handover(&db_tx, cmd.handover_id).await?;
            if !self
                .can_act_for_station(&db_tx, actor, &handover.station_id)
                .await?
            {
                return Err(EngineError::Permission(format!(
                    "no access to station {}",
                    handover.station_id
                )));
            }
            if handover.status != HandoverStatus::Disputed {
                return Err(EngineError::InvalidState(format!(
                    "handover is {}, not disputed",
                    handover.status.as_str()
                )));
            }

            let result = handovers::Entity::update_many()
                .col_expr(
                    handovers::Column::Status,
                    Expr::value(HandoverStatus::Resolved.as_str()),
                )
                .col_expr(
                    handovers::Column::ResolutionNotes,
                    Expr::value(resolution_notes.clone()),
                )
                .col_expr(
                    handovers::Column::ResolvedAmountMinor,
                    Expr::value(cmd.resolved_amount.map(|amount| amount.minor())),
                )
                .col_expr(handovers::Column::ConfirmedAt, Expr::value(Utc::now()))
                .col_expr(
                    handovers::Column::ConfirmedBy,
                    Expr::value(actor.username.clone()),
                )
                .filter(handovers::Column::Id.eq(handover.id.to_string()))
                .filter(handovers::Column::Status.eq(HandoverStatus::Disputed.as_str()))
                .exec(&db_tx)
                .await?;
            require_transition(result, "handover was resolved concurrently")?;

            self.require_handover(&db_tx, handover.id).await
        })
    }

    /// Records a bank deposit closing out a chain. The owner is sender and
    /// confirming authority in one step, since the bank is external.
    pub async fn record_bank_deposit(
        &self,
        actor: &Actor,
        cmd: BankDepositCmd,
    ) -> ResultEngine<CashHandover> {
        actor.require_min_role(Role::Owner)?;
        with_tx!(self, |db_tx| {
            self.require_station_access(&db_tx, actor, &cmd.station_id)
                .await?;

            let (previous, expected) = match cmd.previous_handover_id {
                Some(previous_id) => {
                    let previous = self.require_handover(&db_tx, previous_id).await?;
                    if previous.station_id != cmd.station_id {
                        return Err(EngineError::Validation(format!(
                            "previous handover belongs to station {}",
                            previous.station_id
                        )));
                    }
                    let expected = settled_amount(&previous)?;
                    (Some(previous.id), expected)
                }
                None => (None, cmd.amount),
            };

            let deposited_at = cmd.deposited_at.unwrap_or_else(Utc::now);
            let mut handover = CashHandover::new(
                cmd.station_id,
                HandoverType::DepositToBank,
                Some(actor.username.clone()),
                expected,
                deposited_at,
            );
            handover.previous_handover_id = previous;
            handover.status = HandoverStatus::Confirmed;
            handover.actual_amount = Some(cmd.amount);
            handover.difference = Some(variance(expected, cmd.amount));
            handover.confirmed_at = Some(deposited_at);
            handover.confirmed_by = Some(actor.username.clone());
            handover.bank_name = normalize_optional_text(cmd.bank_name.as_deref());
            handover.deposit_reference = normalize_optional_text(cmd.deposit_reference.as_deref());
            handover.deposit_receipt_url =
                normalize_optional_text(cmd.deposit_receipt_url.as_deref());
            handover.notes = normalize_optional_text(cmd.notes.as_deref());
            handovers::ActiveModel::from(&handover).insert(&db_tx).await?;
            Ok(handover)
        })
    }

    /// Pending handovers addressed to the caller, directly or via role: a
    /// manager also sees pending collections at their station, the owner the
    /// pending owner-bound legs of stations they own, a super admin all.
    pub async fn pending_handovers(&self, actor: &Actor) -> ResultEngine<Vec<CashHandover>> {
        with_tx!(self, |db_tx| {
            let mut scope = Condition::any()
                .add(handovers::Column::ToUserId.eq(actor.username.clone()));
            match actor.role {
                Role::SuperAdmin => {
                    scope = Condition::all();
                }
                Role::Owner => {
                    let owned = self.owned_station_ids(&db_tx, &actor.username).await?;
                    scope = scope.add(
                        Condition::all()
                            .add(handovers::Column::StationId.is_in(owned))
                            .add(handovers::Column::HandoverType.is_in([
                                HandoverType::ManagerToOwner.as_str(),
                                HandoverType::DepositToBank.as_str(),
                            ])),
                    );
                }
                Role::Manager => {
                    if let Some(station_id) = actor.station_id.clone() {
                        scope = scope.add(
                            Condition::all()
                                .add(handovers::Column::StationId.eq(station_id))
                                .add(handovers::Column::HandoverType.is_in([
                                    HandoverType::ShiftCollection.as_str(),
                                    HandoverType::EmployeeToManager.as_str(),
                                ])),
                        );
                    }
                }
                Role::Employee => {}
            }

            let rows = handovers::Entity::find()
                .filter(handovers::Column::Status.eq(HandoverStatus::Pending.as_str()))
                .filter(scope)
                .order_by_asc(handovers::Column::CreatedAt)
                .all(&db_tx)
                .await?;
            rows.into_iter().map(CashHandover::try_from).collect()
        })
    }

    /// Walks a handover's predecessor links back to the root, returning the
    /// chain root-first for audit display.
    pub async fn handover_chain(
        &self,
        actor: &Actor,
        handover_id: Uuid,
    ) -> ResultEngine<Vec<CashHandover>> {
        with_tx!(self, |db_tx| {
            let leaf = self.require_handover(&db_tx, handover_id).await?;
            let involved = leaf.from_user_id.as_deref() == Some(actor.username.as_str())
                || leaf.to_user_id.as_deref() == Some(actor.username.as_str());
            if !involved
                && !self
                    .can_act_for_station(&db_tx, actor, &leaf.station_id)
                    .await?
            {
                return Err(EngineError::Permission(format!(
                    "no access to station {}",
                    leaf.station_id
                )));
            }

            let mut visited = HashSet::from([leaf.id]);
            let mut chain = vec![leaf];
            while let Some(previous_id) = chain
                .last()
                .and_then(|handover| handover.previous_handover_id)
            {
                if !visited.insert(previous_id) {
                    break;
                }
                let previous = self.require_handover(&db_tx, previous_id).await?;
                chain.push(previous);
            }
            chain.reverse();
            Ok(chain)
        })
    }

    pub(super) async fn require_handover(
        &self,
        db: &DatabaseTransaction,
        handover_id: Uuid,
    ) -> ResultEngine<CashHandover> {
        let model = handovers::Entity::find_by_id(handover_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::NotFound("handover not exists".to_string()))?;
        CashHandover::try_from(model)
    }

    /// Confirmation permission: the designated recipient when one is set,
    /// otherwise the role-appropriate recipient for the leg's type at that
    /// station. Owners and super admins may always confirm within their
    /// stations.
    async fn require_recipient(
        &self,
        db: &DatabaseTransaction,
        actor: &Actor,
        handover: &CashHandover,
    ) -> ResultEngine<()> {
        if handover.to_user_id.as_deref() == Some(actor.username.as_str()) {
            return Ok(());
        }
        if actor.role.has_min_role(Role::Owner) {
            if self
                .can_act_for_station(db, actor, &handover.station_id)
                .await?
            {
                return Ok(());
            }
            return Err(EngineError::Permission(format!(
                "no access to station {}",
                handover.station_id
            )));
        }
        if handover.to_user_id.is_some() {
            return Err(EngineError::Permission(
                "handover is addressed to another recipient".to_string(),
            ));
        }
        let appropriate = match handover.handover_type {
            HandoverType::ShiftCollection | HandoverType::EmployeeToManager => {
                actor.role.has_min_role(Role::Manager)
                    && self
                        .can_act_for_station(db, actor, &handover.station_id)
                        .await?
            }
            HandoverType::ManagerToOwner | HandoverType::DepositToBank => false,
        };
        if !appropriate {
            return Err(EngineError::Permission(
                "actor is not the recipient of this handover".to_string(),
            ));
        }
        Ok(())
    }
}

/// The counted cash a collection handover roots on. Only ended shifts carry
/// one.
fn collectable_cash(shift: &Shift) -> ResultEngine<MoneyCents> {
    if shift.status != ShiftStatus::Ended {
        return Err(EngineError::InvalidState(format!(
            "shift is {}, not ended",
            shift.status.as_str()
        )));
    }
    shift
        .actual_cash
        .ok_or_else(|| EngineError::InvalidState("shift has no counted cash".to_string()))
}

fn settled_amount(previous: &CashHandover) -> ResultEngine<MoneyCents> {
    if !previous.status.is_settled() {
        return Err(EngineError::Conflict(format!(
            "previous handover is {}, not confirmed or resolved",
            previous.status.as_str()
        )));
    }
    previous.effective_amount().ok_or_else(|| {
        EngineError::InvalidState("previous handover has no settled amount".to_string())
    })
}
