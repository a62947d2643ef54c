//! Dashboard subcommand execution.
//!
//! Every gated subcommand consults a [`RouteGuard`] before touching the
//! backend, and renders the same denial view the authorization engine
//! produces. Denials are a normal terminal state, not errors: the process
//! exits cleanly after printing them.

use vantage_auth::{AuthContext, GuardOutcome, InviteSender, RouteGuard};
use vantage_core::{Action, NewInvite, NewTask, UpdateTask, permissions_overview};

use crate::config::{Command, InvitesCommand, RoleCommand, TasksCommand};

/// Runs one dashboard command against the authorization facade.
pub async fn execute(
    command: Command,
    context: &AuthContext,
    invite_sender: &dyn InviteSender,
) -> anyhow::Result<()> {
    match command {
        Command::Status => status(context),
        Command::Tasks { command } => tasks(context, command).await,
        Command::Users => users(context).await,
        Command::Invites { command } => invites(context, invite_sender, command).await,
        Command::Role { command } => role(context, command).await,
    }
}

/// Evaluates the guard and prints the appropriate view on refusal.
///
/// Returns `true` when the protected command may proceed.
fn gate(context: &AuthContext, guard: &RouteGuard, location: &str) -> bool {
    match guard.evaluate(&context.snapshot(), location) {
        GuardOutcome::Authorized => true,
        GuardOutcome::Loading => {
            println!("Still loading your roles; try again in a moment.");
            false
        }
        GuardOutcome::Denied(denial) => {
            println!("{}", denial.message());
            false
        }
        GuardOutcome::Unauthenticated(redirect) => {
            println!(
                "Please sign in first (wanted {}, start at {}).",
                redirect.from, redirect.to
            );
            false
        }
    }
}

fn status(context: &AuthContext) -> anyhow::Result<()> {
    let snapshot = context.snapshot();
    let Some(principal) = &snapshot.principal else {
        println!("Not signed in. Pass --email/--password or VANTAGE_ACCESS_TOKEN.");
        return Ok(());
    };

    println!("Signed in as {} ({})", principal.email, principal.id);
    match snapshot.effective_role() {
        Some(role) => println!("Effective role: {role}"),
        None => println!("Effective role: none (no role assigned yet)"),
    }

    if !snapshot.memberships.is_empty() {
        println!("Organizations:");
        for membership in &snapshot.memberships {
            let marker = if snapshot.current_org == Some(membership.org_id) {
                " (active)"
            } else {
                ""
            };
            println!(
                "  {} [{}] as {}{marker}",
                membership.org_name, membership.org_id, membership.role
            );
        }
    }

    let held = snapshot.held_roles();
    if !held.is_empty() {
        println!("Allowed actions:");
        for action in Action::actions_for_role_set(&held) {
            println!("  {action} - {}", action.description());
        }
    }

    // The full matrix view is itself a super-admin feature.
    if snapshot.has_permission(Action::ViewSuperDashboard) {
        println!("\nPermissions matrix:");
        for row in permissions_overview() {
            let actions: Vec<String> = row
                .actions
                .iter()
                .map(|action| action.to_string())
                .collect();
            println!("  {}: {}", row.role, actions.join(", "));
        }
    }

    Ok(())
}

async fn tasks(context: &AuthContext, command: TasksCommand) -> anyhow::Result<()> {
    let guard = RouteGuard::new().require_action(Action::ManageOwnTasks);
    if !gate(context, &guard, "/dashboard") {
        return Ok(());
    }
    let snapshot = context.snapshot();
    let Some(user_id) = snapshot.principal.as_ref().map(|principal| principal.id) else {
        return Ok(());
    };
    let store = context.store();

    match command {
        TasksCommand::List => {
            let tasks = store.list_tasks(user_id).await?;
            if tasks.is_empty() {
                println!("No tasks yet.");
            }
            for task in tasks {
                println!(
                    "{}  {:>3}%  {}  {}",
                    task.date, task.progress, task.id, task.title
                );
            }
        }
        TasksCommand::Add {
            title,
            description,
            progress,
            date,
        } => {
            let task = NewTask {
                title,
                description,
                progress,
                date: date.unwrap_or_else(|| jiff::Zoned::now().date()),
            };
            let created = store.create_task(user_id, &task).await?;
            println!("Added task {} ({})", created.title, created.id);
        }
        TasksCommand::Done { id } => {
            let updated = store.update_task(user_id, id, &UpdateTask::done()).await?;
            println!("Done: {}", updated.title);
        }
        TasksCommand::Remove { id } => {
            store.delete_task(user_id, id).await?;
            println!("Removed task {id}");
        }
    }
    Ok(())
}

async fn users(context: &AuthContext) -> anyhow::Result<()> {
    let guard = RouteGuard::new().require_action(Action::ViewUsers);
    if !gate(context, &guard, "/org-admin") {
        return Ok(());
    }
    let snapshot = context.snapshot();
    let Some(org_id) = snapshot.current_org else {
        println!("You are not a member of any organization.");
        return Ok(());
    };

    let members = context.store().list_org_users(org_id).await?;
    if members.is_empty() {
        println!("No users in this organization.");
    }
    for member in members {
        println!("{}  {}  {}", member.user_id, member.role, member.email);
    }
    Ok(())
}

async fn invites(
    context: &AuthContext,
    invite_sender: &dyn InviteSender,
    command: InvitesCommand,
) -> anyhow::Result<()> {
    match command {
        InvitesCommand::List => {
            let guard = RouteGuard::new().require_action(Action::ViewInviteDashboard);
            if !gate(context, &guard, "/invite-admin") {
                return Ok(());
            }
            let invites = context.store().list_invites().await?;
            if invites.is_empty() {
                println!("No pending invites.");
            }
            for invite in invites {
                let org = invite
                    .org_id
                    .map_or_else(|| "-".to_owned(), |org_id| org_id.to_string());
                println!("{}  {}  {}  org: {org}", invite.id, invite.role, invite.email);
            }
        }
        InvitesCommand::Create {
            email,
            role,
            org,
            row_only,
        } => {
            let guard = RouteGuard::new().require_action(Action::InviteUser);
            if !gate(context, &guard, "/invite") {
                return Ok(());
            }
            let invite = NewInvite {
                email,
                role,
                org_id: org.or_else(|| context.snapshot().current_org),
            };
            if row_only {
                let created = context.store().create_invite(&invite).await?;
                println!("Invite recorded for {} ({})", created.email, created.id);
            } else {
                match invite_sender.send_invite(&invite).await {
                    Ok(message) => println!("{message}"),
                    // Delivery failure is user-facing, never fatal.
                    Err(error) => println!("Invite failed: {error}"),
                }
            }
        }
        InvitesCommand::Revoke { id } => {
            let guard = RouteGuard::new().require_action(Action::RevokeInvite);
            if !gate(context, &guard, "/invite-admin") {
                return Ok(());
            }
            context.store().delete_invite(id).await?;
            println!("Invite {id} revoked");
        }
    }
    Ok(())
}

async fn role(context: &AuthContext, command: RoleCommand) -> anyhow::Result<()> {
    let guard = RouteGuard::new().require_action(Action::ManageUsers);
    if !gate(context, &guard, "/admin") {
        return Ok(());
    }

    match command {
        RoleCommand::Set { user_id, role } => {
            // State refreshes only after the write is confirmed.
            let profile = context.store().update_role(user_id, role).await?;
            println!("Role of {} is now {}", profile.id, profile.role);

            let own_id = context.snapshot().principal.as_ref().map(|p| p.id);
            if own_id == Some(user_id) {
                context.refresh().await;
            }
        }
    }
    Ok(())
}
