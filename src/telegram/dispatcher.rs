//! Telegram Bot API dispatch loop.

use std::sync::Arc;

use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, ParseMode};
use tracing::{debug, error, info, warn};
use url::Url;

use crate::commands::{CommandHandler, CommandResult, LinkButton};

/// Runs the long-polling loop until Ctrl+C.
pub async fn run_bot(bot: Bot, handler: Arc<CommandHandler>) {
    info!("Starting Telegram dispatcher...");

    teloxide::repl(bot, move |bot: Bot, msg: Message| {
        let handler = Arc::clone(&handler);
        async move {
            handle_message(&bot, &msg, &handler).await;
            respond(())
        }
    })
    .await;

    info!("Telegram dispatcher stopped");
}

async fn handle_message(bot: &Bot, msg: &Message, handler: &CommandHandler) {
    let Some(text) = msg.text() else {
        return;
    };
    let Some(user) = msg.from.as_ref() else {
        debug!("Ignoring message without sender");
        return;
    };

    let Some(result) = handler.try_handle(user.id.0, text).await else {
        return;
    };

    send_result(bot, msg.chat.id, &result).await;
}

async fn send_result(bot: &Bot, chat_id: ChatId, result: &CommandResult) {
    let mut request = bot.send_message(chat_id, &result.message);

    if result.html {
        request = request.parse_mode(ParseMode::Html);
    }

    if let Some(button) = &result.button {
        match link_keyboard(button) {
            Some(keyboard) => request = request.reply_markup(keyboard),
            None => warn!("Dropping button with invalid URL: {}", button.url),
        }
    }

    if let Err(e) = request.await {
        error!("Failed to send message to chat {}: {}", chat_id, e);
    }
}

fn link_keyboard(button: &LinkButton) -> Option<InlineKeyboardMarkup> {
    let url = Url::parse(&button.url).ok()?;
    Some(InlineKeyboardMarkup::new(vec![vec![
        InlineKeyboardButton::url(button.label.clone(), url),
    ]]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_keyboard_valid_url() {
        let button = LinkButton {
            label: "Pay $10".to_owned(),
            url: "https://your-payment-link.com".to_owned(),
        };
        let keyboard = link_keyboard(&button).unwrap();
        assert_eq!(keyboard.inline_keyboard.len(), 1);
        assert_eq!(keyboard.inline_keyboard[0][0].text, "Pay $10");
    }

    #[test]
    fn test_link_keyboard_invalid_url() {
        let button = LinkButton {
            label: "Pay".to_owned(),
            url: "not a url".to_owned(),
        };
        assert!(link_keyboard(&button).is_none());
    }
}
