use std::sync::Arc;

use teloxide::{
    dispatching::{HandlerExt, UpdateFilterExt, UpdateHandler},
    prelude::*,
    types::{InlineKeyboardButton, InlineKeyboardMarkup, ParseMode},
    utils::{command::BotCommands, html},
};

use crate::quiz::{engine::QuizEngine, error::QuizError, session::parse_choice, Action, Verdict};

pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;
type HandlerResult = Result<(), HandlerError>;

#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "Доступные команды:")]
pub enum Command {
    #[command(description = "приветствие")]
    Start,
    #[command(description = "начать викторину")]
    Quiz,
}

const NO_QUESTIONS_TEXT: &str = "Извините, пока нет доступных вопросов для викторины. Пожалуйста, добавьте вопросы в базу данных.";
const NOT_STARTED_TEXT: &str = "Викторина не запущена. Нажмите /quiz, чтобы начать новую игру.";
const MALFORMED_ANSWER_TEXT: &str = "Не удалось распознать ответ. Выберите один из вариантов под вопросом.";

pub async fn run(bot: Bot, engine: Arc<QuizEngine>) {
    if let Err(e) = bot.set_my_commands(Command::bot_commands()).await {
        log::warn!("Could not register bot commands: {}", e);
    }

    log::info!("Bot is up and polling for updates...");
    Dispatcher::builder(bot, schema())
        .dependencies(dptree::deps![engine])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}

pub fn schema() -> UpdateHandler<HandlerError> {
    dptree::entry()
        .branch(
            Update::filter_message()
                .filter_command::<Command>()
                .endpoint(command),
        )
        .branch(Update::filter_callback_query().endpoint(check_answer))
}

async fn command(bot: Bot, msg: Message, cmd: Command, engine: Arc<QuizEngine>) -> HandlerResult {
    let user = match msg.from() {
        Some(user) => user.clone(),
        None => return Ok(()),
    };

    match cmd {
        Command::Start => {
            bot.send_message(msg.chat.id, greeting(&user.first_name))
                .await?;
        }
        Command::Quiz => match engine.start_session(user.id.0).await {
            Ok(prompt) => send_action(&bot, msg.chat.id, prompt.into()).await?,
            Err(e) => {
                bot.send_message(msg.chat.id, notice(&e)).await?;
            }
        },
    }
    Ok(())
}

async fn check_answer(bot: Bot, q: CallbackQuery, engine: Arc<QuizEngine>) -> HandlerResult {
    // Telegram keeps the button spinning until the query is acknowledged
    bot.answer_callback_query(q.id.clone()).await?;

    let user = q.from.id.0;
    let message = match q.message {
        Some(message) => message,
        None => {
            log::warn!("Callback from user {} without a message, ignoring", user);
            return Ok(());
        }
    };
    let chat_id = message.chat.id;

    let verdict = q
        .data
        .as_deref()
        .ok_or_else(|| QuizError::MalformedAnswer(String::new()))
        .and_then(parse_choice)
        .and_then(|choice| engine.answer(user, choice));
    let verdict = match verdict {
        Ok(verdict) => verdict,
        Err(e @ QuizError::MalformedAnswer(_)) => {
            bot.send_message(chat_id, notice(&e)).await?;
            return Ok(());
        }
        Err(e) => {
            bot.edit_message_text(chat_id, message.id, notice(&e))
                .await?;
            return Ok(());
        }
    };

    let answered = format!(
        "{}\n\n{}",
        html::escape(message.text().unwrap_or_default()),
        verdict_text(&verdict)
    );
    let edited = bot
        .edit_message_text(chat_id, message.id, answered)
        .parse_mode(ParseMode::Html)
        .reply_markup(InlineKeyboardMarkup::new(
            Vec::<Vec<InlineKeyboardButton>>::new(),
        ))
        .await;
    if let Err(e) = edited {
        log::warn!(
            "Could not edit answered question for user {}: {}. Sending the result separately",
            user,
            e
        );
        send_action(&bot, chat_id, verdict.into()).await?;
    }

    match engine.current_prompt(user) {
        Ok(prompt) => send_action(&bot, chat_id, prompt.into()).await?,
        Err(e) => {
            bot.send_message(chat_id, notice(&e)).await?;
        }
    }
    Ok(())
}

async fn send_action(bot: &Bot, chat_id: ChatId, action: Action) -> HandlerResult {
    match action {
        Action::ShowQuestion { text, options } => {
            bot.send_message(chat_id, text)
                .reply_markup(keyboard(&options))
                .await?;
        }
        Action::ReportVerdict(verdict) => {
            bot.send_message(chat_id, verdict_text(&verdict))
                .parse_mode(ParseMode::Html)
                .await?;
        }
        Action::ReportCompletion { final_score, total } => {
            bot.send_message(chat_id, completion_text(final_score, total))
                .await?;
        }
    }
    Ok(())
}

fn greeting(first_name: &str) -> String {
    format!(
        "Привет, {}! 👋\nДобро пожаловать в викторину! 🧠\nНажми /quiz, чтобы начать игру.",
        first_name
    )
}

/// One option per row; the callback payload is the option index.
fn keyboard(options: &[String]) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(
        options
            .iter()
            .enumerate()
            .map(|(i, option)| vec![InlineKeyboardButton::callback(option.clone(), i.to_string())])
            .collect::<Vec<_>>(),
    )
}

fn verdict_text(verdict: &Verdict) -> String {
    let result = if verdict.correct {
        "✅ Правильно!".to_string()
    } else {
        format!(
            "❌ Неправильно. Правильный ответ: {}.",
            html::bold(&html::escape(&verdict.correct_text))
        )
    };
    format!(
        "{}\nВаш текущий счет: {} из {}.",
        result, verdict.score_after, verdict.total
    )
}

fn completion_text(final_score: usize, total: usize) -> String {
    format!(
        "Викторина завершена! 🎉\nВаш итоговый счет: {} из {}.",
        final_score, total
    )
}

fn notice(error: &QuizError) -> String {
    match error {
        QuizError::NoQuestions => NO_QUESTIONS_TEXT.to_string(),
        QuizError::SessionNotFound => NOT_STARTED_TEXT.to_string(),
        QuizError::AlreadyFinished { score, total } => format!(
            "Викторина уже завершена! Ваш счет: {} из {}.",
            score, total
        ),
        QuizError::MalformedAnswer(_) => MALFORMED_ANSWER_TEXT.to_string(),
    }
}
