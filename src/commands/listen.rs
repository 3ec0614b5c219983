use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Context;
use clap::Args;

use crate::config::{self, Config};
use crate::error::{ComposeError, ExitError};
use crate::lookup::{BikeIndexClient, SerialLookup};
use crate::message::IncomingMessage;
use crate::platform::{self, BotIdentity, MessageStream, PlatformLimits, ReplyPoster, RestPoster};
use crate::route::route;
use crate::strip::{is_absent, strip_entities};
use crate::template::Templates;

#[derive(Debug, Args)]
pub struct ListenArgs {
    /// Path to the config file (defaults to .stolenbot.toml in the current directory)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl ListenArgs {
    pub fn execute(&self) -> anyhow::Result<()> {
        let config = load_config(self.config.clone())?;
        let token = config.auth.resolve_bearer_token()?;
        let templates = config.replies.templates();
        templates
            .validate()
            .map_err(|e| ExitError::Config(format!("bad reply template: {e}")))?;

        let poster = RestPoster::new(
            &config.platform.rest_base_url,
            &token,
            config.platform.max_message_len,
        );
        // The short-URL length is only known to the platform; fetch it once.
        let limits = poster.configuration()?;
        let identity = poster
            .verify_credentials()
            .map_err(|e| ExitError::Credentials(format!("{e:#}")))?;
        tracing::info!(screen_name = %identity.screen_name, "authenticated");

        let lookup = BikeIndexClient::new(&config.lookup.base_url);
        let listener = Listener::new(identity, limits, lookup, poster, templates);

        let shutdown = Arc::new(AtomicBool::new(false));
        {
            let shutdown = Arc::clone(&shutdown);
            ctrlc::set_handler(move || shutdown.store(true, Ordering::SeqCst))
                .context("installing signal handler")?;
        }

        let mut stream = platform::open_stream(&config.platform.stream_url, &token)
            .map_err(|e| ExitError::Stream(format!("{e:#}")))?;
        tracing::info!("connected");

        listener.run(&mut stream, &shutdown)
    }
}

fn load_config(explicit: Option<PathBuf>) -> anyhow::Result<Config> {
    let path = match explicit {
        Some(path) => path,
        None => {
            let cwd = std::env::current_dir().context("could not determine current directory")?;
            config::find_config(&cwd).ok_or_else(|| {
                ExitError::Config(format!(
                    "no {} found in {} (run `stolenbot init` first)",
                    config::CONFIG_FILE,
                    cwd.display()
                ))
            })?
        }
    };
    Config::load(&path)
}

/// Per-message dispatcher. Holds no cross-message state: every message is
/// handled independently, so a failure in one never touches the next.
pub struct Listener<L, P> {
    identity: BotIdentity,
    limits: PlatformLimits,
    lookup: L,
    poster: P,
    templates: Templates,
}

impl<L: SerialLookup, P: ReplyPoster> Listener<L, P> {
    pub fn new(
        identity: BotIdentity,
        limits: PlatformLimits,
        lookup: L,
        poster: P,
        templates: Templates,
    ) -> Self {
        Self {
            identity,
            limits,
            lookup,
            poster,
            templates,
        }
    }

    /// Pull messages until the stream ends or shutdown is requested. An
    /// in-flight message always finishes before the loop exits.
    pub fn run(&self, stream: &mut impl MessageStream, shutdown: &AtomicBool) -> anyhow::Result<()> {
        while !shutdown.load(Ordering::SeqCst) {
            let event = stream
                .next_event()
                .map_err(|e| ExitError::Stream(format!("{e:#}")))?;
            let Some(message) = event else {
                tracing::info!("stream ended");
                break;
            };
            if let Err(e) = self.handle_message(&message) {
                tracing::warn!(message_id = message.id, "message handling failed: {e:#}");
            }
        }
        Ok(())
    }

    /// The full decision tree for one message, as explicit early returns.
    pub fn handle_message(&self, message: &IncomingMessage) -> anyhow::Result<()> {
        // Never answer our own outgoing messages.
        if message.author_id == self.identity.id {
            tracing::debug!(message_id = message.id, "skipping own message");
            return Ok(());
        }

        let key = strip_entities(&message.text, &message.spans);
        let at_screen_name = format!("@{}", message.author_screen_name);

        // "absent" means the sender's bike has no serial; searching would
        // match thousands of records, so answer with the canned link.
        if is_absent(&key) {
            let reply = self.templates.absent(&at_screen_name)?;
            self.post(&reply, message.id)?;
            return Ok(());
        }

        tracing::debug!(serial = %key, "searching");
        let bikes = self.lookup.search(&key)?;
        let close_bikes = if bikes.is_empty() {
            self.lookup.close_serials(&key)?
        } else {
            Vec::new()
        };
        tracing::debug!(matches = bikes.len(), close = close_bikes.len(), "lookup done");

        let replies = match route(
            &key,
            &at_screen_name,
            &bikes,
            &close_bikes,
            &self.templates,
            self.limits,
        ) {
            Ok(replies) => replies,
            Err(e) if e.downcast_ref::<ComposeError>().is_some() => {
                // Data-contract violation in a record: apologize instead of
                // posting a malformed reply.
                tracing::warn!(serial = %key, "incomplete record: {e}");
                vec![self.templates.not_found(&at_screen_name)?]
            }
            Err(e) => return Err(e),
        };

        // Posting order matters: the count notice gives context for the
        // per-record replies that follow.
        for reply in &replies {
            self.post(reply, message.id)?;
        }
        Ok(())
    }

    fn post(&self, text: &str, in_reply_to: u64) -> anyhow::Result<()> {
        let confirmation = self.poster.post(text, in_reply_to)?;
        tracing::info!(sent = %confirmation);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    use crate::error::LookupError;
    use crate::lookup::Bike;

    struct FakeLookup {
        bikes: Vec<Bike>,
        close_bikes: Vec<Bike>,
        searches: RefCell<usize>,
        close_searches: RefCell<usize>,
        fail: bool,
    }

    impl FakeLookup {
        fn with(bikes: Vec<Bike>, close_bikes: Vec<Bike>) -> Self {
            Self {
                bikes,
                close_bikes,
                searches: RefCell::new(0),
                close_searches: RefCell::new(0),
                fail: false,
            }
        }

        fn failing() -> Self {
            let mut lookup = Self::with(vec![], vec![]);
            lookup.fail = true;
            lookup
        }
    }

    impl SerialLookup for FakeLookup {
        fn search(&self, _serial: &str) -> Result<Vec<Bike>, LookupError> {
            *self.searches.borrow_mut() += 1;
            if self.fail {
                return Err(LookupError::Status(503));
            }
            Ok(self.bikes.clone())
        }

        fn close_serials(&self, _serial: &str) -> Result<Vec<Bike>, LookupError> {
            *self.close_searches.borrow_mut() += 1;
            if self.fail {
                return Err(LookupError::Status(503));
            }
            Ok(self.close_bikes.clone())
        }
    }

    #[derive(Default)]
    struct FakePoster {
        posts: RefCell<Vec<(String, u64)>>,
    }

    impl ReplyPoster for FakePoster {
        fn configuration(&self) -> anyhow::Result<PlatformLimits> {
            Ok(LIMITS)
        }

        fn verify_credentials(&self) -> anyhow::Result<BotIdentity> {
            Ok(bot_identity())
        }

        fn post(&self, text: &str, in_reply_to: u64) -> anyhow::Result<String> {
            self.posts.borrow_mut().push((text.to_string(), in_reply_to));
            Ok(text.to_string())
        }
    }

    const LIMITS: PlatformLimits = PlatformLimits {
        max_message_len: 140,
        short_url_len: 23,
    };
    const BOT_ID: u64 = 1001;

    fn bot_identity() -> BotIdentity {
        BotIdentity {
            id: BOT_ID,
            screen_name: "isitstolen".to_string(),
        }
    }

    fn listener(lookup: FakeLookup) -> Listener<FakeLookup, FakePoster> {
        Listener::new(
            bot_identity(),
            LIMITS,
            lookup,
            FakePoster::default(),
            Templates::default(),
        )
    }

    fn message(author_id: u64, text: &str) -> IncomingMessage {
        IncomingMessage {
            id: 555,
            author_id,
            author_screen_name: "rider".to_string(),
            text: text.to_string(),
            spans: vec![],
        }
    }

    fn bike(model: &str) -> Bike {
        Bike {
            stolen: true,
            frame_colors: vec!["Black".to_string()],
            manufacturer_name: Some("Surly".to_string()),
            frame_model: Some(model.to_string()),
            serial: "XJ12345".to_string(),
            url: Some("https://t.co/AAAAAAAAAA".to_string()),
        }
    }

    #[test]
    fn own_messages_trigger_no_lookup_and_no_reply() {
        let l = listener(FakeLookup::with(vec![bike("Steamroller")], vec![]));
        l.handle_message(&message(BOT_ID, "XJ12345")).unwrap();
        assert_eq!(*l.lookup.searches.borrow(), 0);
        assert!(l.poster.posts.borrow().is_empty());
    }

    #[test]
    fn absent_key_short_circuits_the_lookup() {
        let l = listener(FakeLookup::with(vec![bike("Steamroller")], vec![]));
        l.handle_message(&message(42, "  Absent  ")).unwrap();
        assert_eq!(*l.lookup.searches.borrow(), 0);
        let posts = l.poster.posts.borrow();
        assert_eq!(posts.len(), 1);
        assert!(posts[0].0.contains("way too many bikes without serial numbers"));
        assert_eq!(posts[0].1, 555);
    }

    #[test]
    fn single_match_posts_one_composed_reply() {
        let l = listener(FakeLookup::with(vec![bike("Steamroller")], vec![]));
        l.handle_message(&message(42, "XJ12345")).unwrap();
        let posts = l.poster.posts.borrow();
        assert_eq!(posts.len(), 1);
        assert_eq!(
            posts[0].0,
            "@rider Black Surly Steamroller STOLEN https://t.co/AAAAAAAAAA"
        );
    }

    #[test]
    fn close_serials_only_checked_when_exact_search_is_empty() {
        let l = listener(FakeLookup::with(vec![bike("Steamroller")], vec![]));
        l.handle_message(&message(42, "XJ12345")).unwrap();
        assert_eq!(*l.lookup.close_searches.borrow(), 0);

        let l = listener(FakeLookup::with(vec![], vec![]));
        l.handle_message(&message(42, "XJ12345")).unwrap();
        assert_eq!(*l.lookup.close_searches.borrow(), 1);
    }

    #[test]
    fn two_matches_post_notice_then_records_in_order() {
        let l = listener(FakeLookup::with(vec![bike("Steamroller"), bike("Tug")], vec![]));
        l.handle_message(&message(42, "XJ12345")).unwrap();
        let posts = l.poster.posts.borrow();
        assert_eq!(posts.len(), 3);
        assert!(posts[0].0.contains("There are 2 bikes"));
        assert!(posts[1].0.contains("Steamroller"));
        assert!(posts[2].0.contains("Tug"));
    }

    #[test]
    fn lookup_failure_posts_nothing() {
        let l = listener(FakeLookup::failing());
        let err = l.handle_message(&message(42, "XJ12345")).unwrap_err();
        assert!(err.downcast_ref::<LookupError>().is_some());
        assert!(l.poster.posts.borrow().is_empty());
    }

    #[test]
    fn incomplete_record_falls_back_to_the_sorry_reply() {
        let mut incomplete = bike("Steamroller");
        incomplete.manufacturer_name = None;
        let l = listener(FakeLookup::with(vec![incomplete], vec![]));
        l.handle_message(&message(42, "XJ12345")).unwrap();
        let posts = l.poster.posts.borrow();
        assert_eq!(posts.len(), 1);
        assert!(posts[0].0.starts_with("Sorry @rider"));
    }

    #[test]
    fn one_bad_message_does_not_stop_the_stream() {
        use crate::platform::JsonLineStream;
        use std::io::Cursor;

        let lines = concat!(
            r#"{"id": 1, "text": "XJ12345", "user": {"id": 42, "screen_name": "rider"}}"#, "\n",
            r#"{"id": 2, "text": "XJ12345", "user": {"id": 43, "screen_name": "other"}}"#, "\n",
        );
        let mut stream = JsonLineStream::new(Cursor::new(lines));

        let l = listener(FakeLookup::failing());
        let shutdown = AtomicBool::new(false);
        l.run(&mut stream, &shutdown).unwrap();
        // Both messages were attempted despite both lookups failing.
        assert_eq!(*l.lookup.searches.borrow(), 2);
    }

    #[test]
    fn shutdown_flag_stops_before_the_next_message() {
        use crate::platform::JsonLineStream;
        use std::io::Cursor;

        let lines = r#"{"id": 1, "text": "XJ12345", "user": {"id": 42, "screen_name": "rider"}}"#;
        let mut stream = JsonLineStream::new(Cursor::new(lines));
        let l = listener(FakeLookup::with(vec![], vec![]));
        let shutdown = AtomicBool::new(true);
        l.run(&mut stream, &shutdown).unwrap();
        assert_eq!(*l.lookup.searches.borrow(), 0);
    }

    #[test]
    fn mention_is_stripped_before_the_search() {
        use crate::message::{Span, SpanKind};

        let l = listener(FakeLookup::with(vec![], vec![]));
        let mut msg = message(42, "@isitstolen XJ12345");
        msg.spans = vec![Span::new(0, 11, SpanKind::Mention)];
        l.handle_message(&msg).unwrap();
        // Not-found reply proves the search ran on the stripped key; the
        // fake records the call count either way.
        assert_eq!(*l.lookup.searches.borrow(), 1);
        let posts = l.poster.posts.borrow();
        assert!(posts[0].0.starts_with("Sorry @rider"));
    }
}
