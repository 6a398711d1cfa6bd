//! `target`: show or change the targeted organisation and space.

use clap::Parser;

use super::{CommandFault, CommandMetadata, CoreCommand, parse_args};
use crate::context::CommandContext;
use crate::session::{HostSession, TargetFields};

#[derive(Debug, Parser)]
struct TargetArgs {
    /// Organisation to target.
    #[arg(short = 'o')]
    org: Option<String>,
    /// Space to target.
    #[arg(short = 's')]
    space: Option<String>,
}

const TARGET: CommandMetadata = CommandMetadata {
    name: "target",
    alias: Some("t"),
    description: "Set or view the targeted org or space",
    usage: "cf target [-o ORG] [-s SPACE]",
};

pub(super) struct TargetCommand;

impl CoreCommand for TargetCommand {
    fn metadata(&self) -> CommandMetadata {
        TARGET
    }

    fn execute(&self, ctx: &mut CommandContext, args: &[String]) -> Result<(), CommandFault> {
        let Some(parsed) = parse_args::<TargetArgs>(ctx, TARGET.name, args)? else {
            return Ok(());
        };
        if parsed.org.is_some() || parsed.space.is_some() {
            retarget(ctx, &parsed)?;
        }
        let session = ctx.session().snapshot();
        show_target(ctx, &session)
    }
}

fn retarget(ctx: &CommandContext, args: &TargetArgs) -> Result<(), CommandFault> {
    let mut session = ctx.require_login()?;
    if let Some(org_name) = &args.org {
        let org = ctx.platform().org(org_name)?.org;
        session.organization_fields = TargetFields::new(org.guid, org.name);
        session.space_fields = TargetFields::default();
    }
    if let Some(space_name) = &args.space {
        if !session.has_organization() {
            return Err(CommandFault::NoOrgTargeted);
        }
        let space = ctx
            .platform()
            .space(&session.organization_fields.guid, space_name)?
            .space;
        session.space_fields = TargetFields::new(space.guid, space.name);
    }
    ctx.session().update(|current| {
        current.organization_fields = session.organization_fields;
        current.space_fields = session.space_fields;
    })?;
    Ok(())
}

fn show_target(ctx: &CommandContext, session: &HostSession) -> Result<(), CommandFault> {
    ctx.say_all([
        format!("API endpoint:   {}", session.target),
        format!("API version:    {}", session.api_version),
        format!("user:           {}", session.username()),
    ])?;
    match (session.has_organization(), session.has_space()) {
        (false, _) => ctx.say("No org or space targeted, use 'cf target -o ORG -s SPACE'"),
        (true, has_space) => {
            ctx.say(format!("org:            {}", session.organization_fields.name))?;
            if has_space {
                ctx.say(format!("space:          {}", session.space_fields.name))
            } else {
                ctx.say("No space targeted, use 'cf target -s SPACE'")
            }
        }
    }
}
