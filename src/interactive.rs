//! Drives a simulator from a text stream on a real-time tick.

use grbl_simulator::realtime::{JOG_CANCEL, SOFT_RESET};
use grbl_simulator::{SimEvent, Simulator, Submission, is_realtime};
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::MissedTickBehavior;

/// Typed stand-ins for bytes a terminal cannot send on its own.
fn control_byte(input: &str) -> Option<u8> {
    match input {
        "^X" | "^x" => Some(SOFT_RESET),
        "^J" | "^j" => Some(JOG_CANCEL),
        _ => None,
    }
}

/// Splits real-time characters out of `input`, runs them, then submits
/// the remaining text as a line. Returns immediate output.
fn handle_input(sim: &mut Simulator, input: &str, pending: &mut usize) -> Vec<String> {
    let mut out = Vec::new();
    let mut realtime = |sim: &mut Simulator, byte: u8, out: &mut Vec<String>| {
        if byte == SOFT_RESET {
            // Queued lines are discarded by the reset and never answered.
            *pending = 0;
        }
        out.extend(sim.realtime(byte));
    };

    if let Some(byte) = control_byte(input.trim()) {
        realtime(sim, byte, &mut out);
        return out;
    }

    let mut text = String::with_capacity(input.len());
    for c in input.chars() {
        if c.is_ascii() && is_realtime(c as u8) {
            realtime(sim, c as u8, &mut out);
        } else {
            text.push(c);
        }
    }
    let text = text.trim();
    if !text.is_empty() {
        match sim.submit_line(text) {
            Submission::Done(response) => out.push(response),
            Submission::Pending(_) => *pending += 1,
        }
    }
    out
}

/// Runs until `reader` is exhausted and every accepted line has been
/// answered and motion has stopped.
pub async fn run_session<R, W>(
    sim: &mut Simulator,
    reader: R,
    mut writer: W,
    tick: Duration,
) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();
    let mut interval = tokio::time::interval(tick.max(Duration::from_millis(1)));
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut pending = 0usize;
    let mut eof = false;

    writer.write_all(sim.banner().as_bytes()).await?;
    writer.flush().await?;

    loop {
        tokio::select! {
            _ = interval.tick() => {
                for event in sim.tick() {
                    let text = match event {
                        SimEvent::LineComplete { response, .. } => {
                            pending = pending.saturating_sub(1);
                            response
                        }
                        SimEvent::Push(message) => message,
                    };
                    writer.write_all(text.as_bytes()).await?;
                }
                writer.flush().await?;
                let settled = pending == 0 && sim.planner().is_idle() && !sim.dwell_pending();
                if eof && (settled || sim.state().is_suspended()) {
                    tracing::info!("input closed, session finished");
                    break;
                }
            }
            line = lines.next_line(), if !eof => {
                match line? {
                    Some(line) => {
                        for out in handle_input(sim, &line, &mut pending) {
                            writer.write_all(out.as_bytes()).await?;
                        }
                        writer.flush().await?;
                    }
                    None => eof = true,
                }
            }
        }
    }
    Ok(())
}
