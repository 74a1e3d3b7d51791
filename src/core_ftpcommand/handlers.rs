use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use super::context::CommandContext;
use crate::core_proto::Reply;
use crate::error::ServerError;

// PORT/EPRT and PASV/EPSV live with the rest of the data-connection code.
use crate::core_network::pasv;
use crate::core_network::port;

pub type HandlerFuture = Pin<Box<dyn Future<Output = Result<Reply, ServerError>> + Send>>;

pub type CommandHandler =
    Box<dyn Fn(Arc<CommandContext>, String) -> HandlerFuture + Send + Sync>;

/// Verb-to-handler table for one server. Built-ins are installed up front;
/// `register` is the extension surface for additional verbs.
pub struct CommandRegistry {
    handlers: HashMap<String, Arc<CommandHandler>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    pub fn register(&mut self, verb: &str, handler: CommandHandler) {
        self.handlers
            .insert(verb.to_ascii_uppercase(), Arc::new(handler));
    }

    pub fn get(&self, verb: &str) -> Option<Arc<CommandHandler>> {
        self.handlers.get(verb).cloned()
    }

    pub fn verbs(&self) -> Vec<String> {
        let mut verbs: Vec<String> = self.handlers.keys().cloned().collect();
        verbs.sort();
        verbs
    }

    pub fn with_builtins() -> Self {
        let mut registry = Self::new();

        registry.register(
            "USER",
            Box::new(|ctx, arg| Box::pin(super::user::handle_user_command(ctx, arg))),
        );
        registry.register(
            "PASS",
            Box::new(|ctx, arg| Box::pin(super::pass::handle_pass_command(ctx, arg))),
        );
        registry.register(
            "ACCT",
            Box::new(|ctx, arg| Box::pin(super::acct::handle_acct_command(ctx, arg))),
        );
        registry.register(
            "REIN",
            Box::new(|ctx, arg| Box::pin(super::rein::handle_rein_command(ctx, arg))),
        );
        registry.register(
            "QUIT",
            Box::new(|ctx, arg| Box::pin(super::quit::handle_quit_command(ctx, arg))),
        );
        registry.register(
            "CWD",
            Box::new(|ctx, arg| Box::pin(super::cwd::handle_cwd_command(ctx, arg))),
        );
        registry.register(
            "CDUP",
            Box::new(|ctx, arg| Box::pin(super::cdup::handle_cdup_command(ctx, arg))),
        );
        registry.register(
            "PWD",
            Box::new(|ctx, arg| Box::pin(super::pwd::handle_pwd_command(ctx, arg))),
        );
        registry.register(
            "MKD",
            Box::new(|ctx, arg| Box::pin(super::mkd::handle_mkd_command(ctx, arg))),
        );
        registry.register(
            "RMD",
            Box::new(|ctx, arg| Box::pin(super::rmd::handle_rmd_command(ctx, arg))),
        );
        registry.register(
            "DELE",
            Box::new(|ctx, arg| Box::pin(super::dele::handle_dele_command(ctx, arg))),
        );
        registry.register(
            "RNFR",
            Box::new(|ctx, arg| Box::pin(super::rnfr::handle_rnfr_command(ctx, arg))),
        );
        registry.register(
            "RNTO",
            Box::new(|ctx, arg| Box::pin(super::rnto::handle_rnto_command(ctx, arg))),
        );
        registry.register(
            "SIZE",
            Box::new(|ctx, arg| Box::pin(super::size::handle_size_command(ctx, arg))),
        );
        registry.register(
            "MDTM",
            Box::new(|ctx, arg| Box::pin(super::mdtm::handle_mdtm_command(ctx, arg))),
        );
        registry.register(
            "STAT",
            Box::new(|ctx, arg| Box::pin(super::stat::handle_stat_command(ctx, arg))),
        );
        registry.register(
            "TYPE",
            Box::new(|ctx, arg| Box::pin(super::type_::handle_type_command(ctx, arg))),
        );
        registry.register(
            "STRU",
            Box::new(|ctx, arg| Box::pin(super::stru::handle_stru_command(ctx, arg))),
        );
        registry.register(
            "MODE",
            Box::new(|ctx, arg| Box::pin(super::mode::handle_mode_command(ctx, arg))),
        );
        registry.register(
            "PORT",
            Box::new(|ctx, arg| Box::pin(port::handle_port_command(ctx, arg))),
        );
        registry.register(
            "EPRT",
            Box::new(|ctx, arg| Box::pin(port::handle_eprt_command(ctx, arg))),
        );
        registry.register(
            "PASV",
            Box::new(|ctx, arg| Box::pin(pasv::handle_pasv_command(ctx, arg))),
        );
        registry.register(
            "EPSV",
            Box::new(|ctx, arg| Box::pin(pasv::handle_epsv_command(ctx, arg))),
        );
        registry.register(
            "RETR",
            Box::new(|ctx, arg| Box::pin(super::retr::handle_retr_command(ctx, arg))),
        );
        registry.register(
            "STOR",
            Box::new(|ctx, arg| Box::pin(super::stor::handle_stor_command(ctx, arg))),
        );
        registry.register(
            "APPE",
            Box::new(|ctx, arg| Box::pin(super::appe::handle_appe_command(ctx, arg))),
        );
        registry.register(
            "STOU",
            Box::new(|ctx, arg| Box::pin(super::stou::handle_stou_command(ctx, arg))),
        );
        registry.register(
            "LIST",
            Box::new(|ctx, arg| Box::pin(super::list::handle_list_command(ctx, arg))),
        );
        registry.register(
            "NLST",
            Box::new(|ctx, arg| Box::pin(super::nlst::handle_nlst_command(ctx, arg))),
        );
        registry.register(
            "MLSD",
            Box::new(|ctx, arg| Box::pin(super::mlsd::handle_mlsd_command(ctx, arg))),
        );
        registry.register(
            "MLST",
            Box::new(|ctx, arg| Box::pin(super::mlst::handle_mlst_command(ctx, arg))),
        );
        registry.register(
            "REST",
            Box::new(|ctx, arg| Box::pin(super::rest::handle_rest_command(ctx, arg))),
        );
        registry.register(
            "ABOR",
            Box::new(|ctx, arg| Box::pin(super::abor::handle_abor_command(ctx, arg))),
        );
        registry.register(
            "AUTH",
            Box::new(|ctx, arg| Box::pin(super::auth::handle_auth_command(ctx, arg))),
        );
        registry.register(
            "PBSZ",
            Box::new(|ctx, arg| Box::pin(super::pbsz::handle_pbsz_command(ctx, arg))),
        );
        registry.register(
            "PROT",
            Box::new(|ctx, arg| Box::pin(super::prot::handle_prot_command(ctx, arg))),
        );
        registry.register(
            "FEAT",
            Box::new(|ctx, arg| Box::pin(super::feat::handle_feat_command(ctx, arg))),
        );
        registry.register(
            "OPTS",
            Box::new(|ctx, arg| Box::pin(super::opts::handle_opts_command(ctx, arg))),
        );
        registry.register(
            "HELP",
            Box::new(|ctx, arg| Box::pin(super::help::handle_help_command(ctx, arg))),
        );
        registry.register(
            "NOOP",
            Box::new(|ctx, arg| Box::pin(super::noop::handle_noop_command(ctx, arg))),
        );
        registry.register(
            "SYST",
            Box::new(|ctx, arg| Box::pin(super::syst::handle_syst_command(ctx, arg))),
        );
        registry.register(
            "ALLO",
            Box::new(|ctx, arg| Box::pin(super::allo::handle_allo_command(ctx, arg))),
        );

        registry
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_cover_the_command_set() {
        let registry = CommandRegistry::with_builtins();
        for verb in [
            "USER", "PASS", "QUIT", "PASV", "EPSV", "RETR", "STOR", "ABOR", "AUTH", "PROT",
            "MLSD", "REST",
        ] {
            assert!(registry.get(verb).is_some(), "missing builtin {}", verb);
        }
        assert!(registry.get("XYZZY").is_none());
    }

    #[test]
    fn extensions_can_be_registered() {
        let mut registry = CommandRegistry::with_builtins();
        registry.register(
            "site",
            Box::new(|_ctx, _arg| Box::pin(async { Ok(Reply::new(200, "Noted.")) })),
        );
        assert!(registry.get("SITE").is_some());
    }
}
