use crate::board::{sync_board, ChatChannel};
use crate::command::{parse, Command, ParseError};
use crate::error::{Result, TallyError};
use crate::model::{normalize_key, Document};
use crate::render::render;
use crate::tracker::Tracker;
use tokio::sync::Mutex;

pub const HELP_TEXT: &str = "\
Commands:
{p}add [activity] [system] [total] [kind]
   - Creates or UPDATES the activity (keeps progress)
   - Ex: {p}add NDS_CORP KD 1 CORP
   - Ex: {p}add NDS_NUESTRA G9 3 NUESTRA
   - Ex: {p}add LUNAR KD 1 NUESTRA

{p}register [activity] [system] [who]
   - Adds +1 to progress; optionally say who did it
   - Ex: {p}register NDS_NUESTRA KD cami

{p}undo [activity] [system] [amount]
   - Takes progress back (never below 0)
   - Aliases: {p}deshacer, {p}restar, {p}desregistrar

{p}remove [activity] [system]
   - Deletes the activity from the system
   - Ex: {p}remove LUNAR KD

{p}reset
   - Sets progress to 0 on EVERY activity (deletes nothing)

{p}show
   - Posts the current table and refreshes the channel board
";

/// Executes commands against the shared tracker.
///
/// The tracker lock is held for the whole command, board sync included, so
/// commands from concurrent channels never interleave their writes.
pub struct Handler {
    tracker: Mutex<Tracker>,
    prefix: String,
}

impl Handler {
    pub fn new(tracker: Tracker, prefix: impl Into<String>) -> Self {
        Self {
            tracker: Mutex::new(tracker),
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Consistent copy of the current document.
    pub async fn snapshot(&self) -> Document {
        self.tracker.lock().await.document().clone()
    }

    pub fn help_text(&self) -> String {
        HELP_TEXT.replace("{p}", &self.prefix)
    }

    /// Parse `text` and run it if it is a command. Argument errors are
    /// answered with a usage hint; unknown verbs are ignored.
    pub async fn handle_message(&self, channel: &dyn ChatChannel, text: &str) -> Result<()> {
        match parse(&self.prefix, text) {
            Ok(Some(cmd)) => self.handle(channel, cmd).await,
            Ok(None) => Ok(()),
            Err(ParseError::UnknownCommand(verb)) => {
                tracing::debug!(channel = channel.id(), %verb, "ignoring unknown command");
                Ok(())
            }
            Err(e) => {
                let mut reply = format!("⚠️ {e}.");
                if let Some(usage) = e.usage() {
                    reply.push_str(&format!(" Usage: `{}{usage}`", self.prefix));
                }
                channel.send(&reply).await?;
                Ok(())
            }
        }
    }

    pub async fn handle(&self, channel: &dyn ChatChannel, cmd: Command) -> Result<()> {
        tracing::info!(channel = channel.id(), command = cmd.name(), "handling command");
        let mut tracker = self.tracker.lock().await;

        match cmd {
            Command::Add {
                activity,
                system,
                total,
                kind,
            } => {
                let act = tracker.add_or_update(&system, &activity, total, &kind)?;
                let reply = format!(
                    "✅ {} in {} now has total {} ({}).",
                    act.name,
                    normalize_key(&system),
                    act.total,
                    act.tipo
                );
                channel.send(&reply).await?;
            }
            Command::Register {
                activity,
                system,
                actor,
            } => match tracker.increment(&system, &activity) {
                Ok(act) => {
                    let label = actor.map(|a| format!(" ({a})")).unwrap_or_default();
                    let reply = format!(
                        "✅ Registered {} in {}{label}: {}/{}",
                        act.name,
                        normalize_key(&system),
                        act.hecho,
                        act.total
                    );
                    channel.send(&reply).await?;
                }
                Err(TallyError::AlreadyComplete {
                    system,
                    activity,
                    hecho,
                    total,
                }) => {
                    let reply =
                        format!("⚠️ {activity} in {system} is already complete ({hecho}/{total}).");
                    channel.send(&reply).await?;
                }
                Err(TallyError::NotFound { .. }) => {
                    channel.send("⚠️ System or activity not found.").await?;
                    return Ok(());
                }
                Err(e) => return Err(e),
            },
            Command::Undo {
                activity,
                system,
                amount,
            } => match tracker.decrement(&system, &activity, amount) {
                Ok(dec) => {
                    let reply = format!(
                        "↩️ Undid {} on {} in {}: {}/{}",
                        dec.removed,
                        normalize_key(&activity),
                        normalize_key(&system),
                        dec.hecho,
                        dec.total
                    );
                    channel.send(&reply).await?;
                }
                Err(TallyError::NotFound { .. }) => {
                    channel.send("⚠️ System or activity not found.").await?;
                    return Ok(());
                }
                Err(TallyError::InvalidAmount(_)) => {
                    channel.send("⚠️ The amount must be >= 1.").await?;
                    return Ok(());
                }
                Err(e) => return Err(e),
            },
            Command::Remove { activity, system } => {
                match tracker.remove(&system, &activity) {
                    Ok(removal) => {
                        let (a, s) = (normalize_key(&activity), normalize_key(&system));
                        let mut reply = format!("🗑️ Removed {a} from {s}.");
                        if removal.system_removed {
                            reply.push_str(&format!(" {s} had nothing left and was removed too."));
                        }
                        channel.send(&reply).await?;
                    }
                    Err(TallyError::NotFound { .. }) => {
                        channel.send("⚠️ That system/activity does not exist.").await?;
                    }
                    Err(e) => return Err(e),
                }
            }
            Command::Reset => {
                let count = tracker.reset_all()?;
                tracing::info!(activities = count, "progress reset");
                channel
                    .send("🔄 Counters reset (systems and activities kept).")
                    .await?;
            }
            Command::Show => {
                channel.send(&render(tracker.document())).await?;
            }
            Command::Help => {
                channel.send(&format!("```{}```", self.help_text())).await?;
                return Ok(());
            }
        }

        sync_board(&mut tracker, channel).await?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::DEFAULT_PREFIX;
    use crate::memory::MemoryChannel;
    use crate::render::{BOARD_HEADER, EMPTY_PLACEHOLDER};
    use tempfile::TempDir;

    fn handler(dir: &TempDir) -> Handler {
        let tracker = Tracker::open(dir.path().join("sistemas.json")).unwrap();
        Handler::new(tracker, DEFAULT_PREFIX)
    }

    async fn run(h: &Handler, chan: &MemoryChannel, text: &str) {
        h.handle_message(chan, text).await.unwrap();
    }

    fn board(chan: &MemoryChannel, doc: &Document) -> String {
        let id = doc.board(chan.id()).expect("board registered");
        chan.content(id).expect("board message exists")
    }

    #[tokio::test]
    async fn add_replies_and_posts_board() {
        let dir = TempDir::new().unwrap();
        let h = handler(&dir);
        let chan = MemoryChannel::new("c");

        run(&h, &chan, "!add nds_corp kd 1 corp").await;

        let msgs = chan.messages();
        assert_eq!(msgs.len(), 2);
        assert_eq!(msgs[0].content, "✅ NDS_CORP in KD now has total 1 (CORP).");
        let doc = h.snapshot().await;
        assert!(board(&chan, &doc).contains(" → NDS (CORP): 0/1"));
    }

    #[tokio::test]
    async fn register_until_complete() {
        let dir = TempDir::new().unwrap();
        let h = handler(&dir);
        let chan = MemoryChannel::new("c");

        run(&h, &chan, "!add NDS_CORP KD 1 CORP").await;
        run(&h, &chan, "!register NDS_CORP KD cami").await;
        run(&h, &chan, "!register NDS_CORP KD").await;

        let texts: Vec<_> = chan.messages().into_iter().map(|m| m.content).collect();
        assert!(texts.contains(&"✅ Registered NDS_CORP in KD (cami): 1/1".to_string()));
        assert!(texts.contains(&"⚠️ NDS_CORP in KD is already complete (1/1).".to_string()));
        let doc = h.snapshot().await;
        assert_eq!(doc.activity("KD", "NDS_CORP").unwrap().hecho, 1);
        assert!(board(&chan, &doc).contains("NDS (CORP): 1/1"));
    }

    #[tokio::test]
    async fn register_unknown_does_not_touch_board() {
        let dir = TempDir::new().unwrap();
        let h = handler(&dir);
        let chan = MemoryChannel::new("c");

        run(&h, &chan, "!register LUNAR KD").await;

        assert_eq!(chan.sent_count(), 1);
        assert_eq!(
            chan.last().unwrap().content,
            "⚠️ System or activity not found."
        );
        assert!(h.snapshot().await.board("c").is_none());
    }

    #[tokio::test]
    async fn undo_clamps_and_reports_removed() {
        let dir = TempDir::new().unwrap();
        let h = handler(&dir);
        let chan = MemoryChannel::new("c");

        run(&h, &chan, "!add NDS_NUESTRA G9 3").await;
        run(&h, &chan, "!register NDS_NUESTRA G9").await;
        run(&h, &chan, "!register NDS_NUESTRA G9").await;
        run(&h, &chan, "!restar NDS_NUESTRA G9 5").await;

        let texts: Vec<_> = chan.messages().into_iter().map(|m| m.content).collect();
        assert!(texts.contains(&"↩️ Undid 2 on NDS_NUESTRA in G9: 0/3".to_string()));
        let doc = h.snapshot().await;
        assert_eq!(doc.activity("G9", "NDS_NUESTRA").unwrap().hecho, 0);
    }

    #[tokio::test]
    async fn undo_rejects_zero_amount() {
        let dir = TempDir::new().unwrap();
        let h = handler(&dir);
        let chan = MemoryChannel::new("c");
        run(&h, &chan, "!add LUNAR KD 2").await;
        run(&h, &chan, "!register LUNAR KD").await;
        let sent = chan.sent_count();

        run(&h, &chan, "!undo LUNAR KD 0").await;

        assert_eq!(chan.sent_count(), sent + 1);
        assert_eq!(chan.last().unwrap().content, "⚠️ The amount must be >= 1.");
        assert_eq!(h.snapshot().await.activity("KD", "LUNAR").unwrap().hecho, 1);
    }

    #[tokio::test]
    async fn remove_last_activity_drops_system_from_board() {
        let dir = TempDir::new().unwrap();
        let h = handler(&dir);
        let chan = MemoryChannel::new("c");
        run(&h, &chan, "!add LUNAR KD 1").await;
        run(&h, &chan, "!quitar LUNAR KD").await;

        let doc = h.snapshot().await;
        assert!(doc.system("KD").is_none());
        assert_eq!(
            board(&chan, &doc),
            format!("{BOARD_HEADER}\n{EMPTY_PLACEHOLDER}")
        );
    }

    #[tokio::test]
    async fn remove_unknown_still_syncs_board() {
        let dir = TempDir::new().unwrap();
        let h = handler(&dir);
        let chan = MemoryChannel::new("c");
        run(&h, &chan, "!remove LUNAR KD").await;

        let msgs = chan.messages();
        assert_eq!(msgs[0].content, "⚠️ That system/activity does not exist.");
        assert!(msgs[1].content.starts_with(BOARD_HEADER));
    }

    #[tokio::test]
    async fn reset_keeps_structure() {
        let dir = TempDir::new().unwrap();
        let h = handler(&dir);
        let chan = MemoryChannel::new("c");
        run(&h, &chan, "!add NDS_CORP KD 2 CORP").await;
        run(&h, &chan, "!register NDS_CORP KD").await;
        let board_before = h.snapshot().await.board("c").map(str::to_string);

        run(&h, &chan, "!reset").await;

        let doc = h.snapshot().await;
        let act = doc.activity("KD", "NDS_CORP").unwrap();
        assert_eq!((act.hecho, act.total, act.tipo.as_str()), (0, 2, "CORP"));
        assert_eq!(doc.board("c").map(str::to_string), board_before);
    }

    #[tokio::test]
    async fn show_posts_fresh_copy_and_keeps_board() {
        let dir = TempDir::new().unwrap();
        let h = handler(&dir);
        let chan = MemoryChannel::new("c");
        run(&h, &chan, "!add LUNAR KD 1").await;
        let board_id = h.snapshot().await.board("c").unwrap().to_string();
        let sent = chan.sent_count();

        run(&h, &chan, "!mostrar").await;

        assert_eq!(chan.sent_count(), sent + 1);
        let copy = chan.last().unwrap();
        assert_ne!(copy.id, board_id);
        assert_eq!(Some(copy.content), chan.content(&board_id));
        assert_eq!(h.snapshot().await.board("c"), Some(board_id.as_str()));
    }

    #[tokio::test]
    async fn help_has_no_side_effects() {
        let dir = TempDir::new().unwrap();
        let h = handler(&dir);
        let chan = MemoryChannel::new("c");
        run(&h, &chan, "!ayuda").await;

        assert_eq!(chan.sent_count(), 1);
        let text = chan.last().unwrap().content;
        assert!(text.starts_with("```Commands:"));
        assert!(text.contains("!register NDS_NUESTRA KD cami"));
        assert!(h.snapshot().await.boards().is_empty());
    }

    #[tokio::test]
    async fn usage_errors_get_a_hint() {
        let dir = TempDir::new().unwrap();
        let h = handler(&dir);
        let chan = MemoryChannel::new("c");
        run(&h, &chan, "!add LUNAR KD lots").await;

        assert_eq!(chan.sent_count(), 1);
        let text = chan.last().unwrap().content;
        assert!(text.starts_with("⚠️ `lots` is not a valid value for `total`."));
        assert!(text.ends_with("Usage: `!add <activity> <system> <total> [kind]`"));
    }

    #[tokio::test]
    async fn unknown_commands_and_chatter_are_ignored() {
        let dir = TempDir::new().unwrap();
        let h = handler(&dir);
        let chan = MemoryChannel::new("c");
        run(&h, &chan, "!dance").await;
        run(&h, &chan, "good morning").await;
        assert_eq!(chan.sent_count(), 0);
    }

    #[tokio::test]
    async fn deleted_board_is_replaced_on_next_command() {
        let dir = TempDir::new().unwrap();
        let h = handler(&dir);
        let chan = MemoryChannel::new("c");
        run(&h, &chan, "!add LUNAR KD 2").await;
        let first = h.snapshot().await.board("c").unwrap().to_string();
        assert!(chan.delete(&first));

        run(&h, &chan, "!register LUNAR KD").await;

        let doc = h.snapshot().await;
        let second = doc.board("c").unwrap();
        assert_ne!(second, first);
        assert!(chan.content(second).unwrap().contains("LUNAR (NUESTRA): 1/2"));
    }
}
