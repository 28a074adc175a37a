//! Ask command handler: runs a queue of prompts against Ollama and streams
//! the conversation markup to stdout.

use std::future::Future;
use std::io;

use anyhow::{Result, bail};
use tth_core::config::{self, Config};
use tth_core::core::interrupt::{self, InterruptedError};
use tth_core::core::turn::{MarkupSink, TurnOutcome, WriterSink, run_turn};
use tth_core::markup::{MessageKind, Transcript};
use tth_core::providers::OllamaClient;

use super::{begin_output, end_output};

pub struct AskOptions<'a> {
    pub prompts: Vec<String>,
    pub config: &'a Config,
    pub model_override: Option<&'a str>,
    pub stream: bool,
    pub page: bool,
}

pub async fn run(options: AskOptions<'_>) -> Result<()> {
    let source = if options.prompts.is_empty() {
        options.config.questions.clone()
    } else {
        options.prompts
    };
    let prompts: Vec<String> = source
        .iter()
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect();
    if prompts.is_empty() {
        let config_path = config::paths::config_path()?;
        bail!(
            "No prompt given. Pass --prompt or set `questions` in {}",
            config_path.display()
        );
    }

    let client = OllamaClient::new(options.config.ollama_config(options.model_override)?);
    let render = &options.config.render;
    let mut transcript = Transcript::new(render.highlighter());
    let mut sink = WriterSink::new(io::stdout().lock());

    begin_output(&mut sink, options.page)?;
    for prompt in &prompts {
        sink.append(&transcript.append(MessageKind::UserRole, &render.user_label))?;
        sink.append(&transcript.append(MessageKind::UserText, prompt))?;
        sink.append(&transcript.append(MessageKind::AiRole, &render.ai_label))?;

        let outcome = if options.stream {
            let stream = until_interrupted(client.generate_stream(prompt)).await?;
            run_turn(stream, &mut transcript, &mut sink).await?
        } else {
            let answer = until_interrupted(client.generate(prompt)).await?;
            sink.append(&transcript.append(MessageKind::AiText, &answer))?;
            sink.append(&transcript.finish_turn())?;
            TurnOutcome::Completed { done_reason: None }
        };

        if outcome == TurnOutcome::Interrupted {
            end_output(&mut sink, options.page)?;
            return Err(InterruptedError.into());
        }
    }
    end_output(&mut sink, options.page)
}

/// Awaits `fut` unless Ctrl+C comes first.
async fn until_interrupted<T>(fut: impl Future<Output = Result<T>>) -> Result<T> {
    tokio::select! {
        biased;
        () = interrupt::wait_for_interrupt() => Err(InterruptedError.into()),
        result = fut => result,
    }
}
