use rifa_core::AdminSession;

use crate::cli::AdminCommands;
use crate::commands::common::open_store;
use crate::config::AppContext;
use crate::error::CliError;

pub fn run_admin(ctx: &AppContext, command: AdminCommands) -> Result<(), CliError> {
    let session = AdminSession::new(open_store(ctx)?);

    match command {
        AdminCommands::Login { password } => {
            session.login(&password, ctx.config.admin_password.as_deref())?;
            println!("Admin session started");
        }
        AdminCommands::Status => {
            if session.is_active()? {
                println!("Admin session active");
            } else {
                println!("Not logged in");
            }
        }
        AdminCommands::Logout => {
            session.logout()?;
            println!("Admin session ended");
        }
    }
    Ok(())
}
