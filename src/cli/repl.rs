use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::application::ToolRouter;
use crate::domain::{DomainError, Turn};

pub const EXIT_COMMAND: &str = "exit";
pub const BANNER: &str = "--- Agent is ready! Type 'exit' to quit. ---";
pub const PROMPT: &str = "You: ";
pub const FAREWELL: &str = "Agent: Goodbye!";

pub fn is_exit(line: &str) -> bool {
    line.trim().eq_ignore_ascii_case(EXIT_COMMAND)
}

/// Interrupt requests for a whole session.
///
/// [`Interrupts::from_ctrl_c`] installs one Ctrl-C listener that lives as long as
/// the process. Once tokio owns SIGINT the default handler no longer runs, so every
/// press has to reach the loop through this stream.
pub struct Interrupts(mpsc::UnboundedReceiver<()>);

impl Interrupts {
    pub fn from_ctrl_c() -> Self {
        let (tx, interrupts) = Self::channel();
        tokio::spawn(async move {
            while tokio::signal::ctrl_c().await.is_ok() {
                if tx.send(()).is_err() {
                    break;
                }
            }
        });
        interrupts
    }

    pub fn channel() -> (mpsc::UnboundedSender<()>, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (tx, Self(rx))
    }

    /// Resolves on the next interrupt. Never resolves once every sender is gone.
    async fn recv(&mut self) {
        if self.0.recv().await.is_none() {
            std::future::pending::<()>().await;
        }
    }
}

/// Line-oriented chat loop. A failed turn is reported and the loop carries on;
/// the exit command, end of input, an interrupt at the prompt or an I/O error on
/// the terminal end it. An interrupt during a turn cancels only that turn.
pub struct Repl<'a> {
    router: &'a ToolRouter,
    verbose: bool,
}

impl<'a> Repl<'a> {
    pub fn new(router: &'a ToolRouter) -> Self {
        Self {
            router,
            verbose: false,
        }
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub async fn run<R, W>(
        &self,
        input: R,
        output: &mut W,
        interrupts: &mut Interrupts,
    ) -> Result<(), DomainError>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = input.lines();
        write_line(output, BANNER).await?;

        loop {
            output.write_all(PROMPT.as_bytes()).await?;
            output.flush().await?;

            let next = tokio::select! {
                line = lines.next_line() => line?,
                _ = interrupts.recv() => {
                    info!("interrupted at the prompt");
                    None
                }
            };
            let Some(line) = next else {
                write_line(output, "").await?;
                write_line(output, FAREWELL).await?;
                break;
            };

            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if is_exit(line) {
                write_line(output, FAREWELL).await?;
                break;
            }

            let outcome = tokio::select! {
                result = self.router.run(line) => Some(result),
                _ = interrupts.recv() => None,
            };

            match outcome {
                Some(Ok(turn)) => self.print_turn(output, &turn).await?,
                Some(Err(e)) => {
                    error!(error = %e, "turn failed");
                    write_line(output, &format!("An error occurred: {e}")).await?;
                }
                None => {
                    warn!("turn cancelled");
                    write_line(output, "\nTurn cancelled.").await?;
                }
            }
        }

        info!("session ended");
        Ok(())
    }

    async fn print_turn<W>(&self, output: &mut W, turn: &Turn) -> Result<(), DomainError>
    where
        W: AsyncWrite + Unpin,
    {
        if self.verbose {
            for entry in &turn.scratchpad {
                write_line(
                    output,
                    &format!(
                        "> {}: {}\n{}\n",
                        entry.tool_name, entry.tool_input, entry.tool_output
                    ),
                )
                .await?;
            }
        }

        let answer = turn.final_output.as_deref().unwrap_or_default();
        write_line(output, &format!("Agent: {answer}")).await
    }
}

async fn write_line<W>(output: &mut W, text: &str) -> Result<(), DomainError>
where
    W: AsyncWrite + Unpin,
{
    output.write_all(text.as_bytes()).await?;
    output.write_all(b"\n").await?;
    output.flush().await?;
    Ok(())
}
