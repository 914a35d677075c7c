//! Shared UI icons and emojis.

use console::Emoji;

// Status indicators
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "[OK]");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "[ERR]");
pub static SPARKLE: Emoji<'_, '_> = Emoji("✨ ", "*");
pub static STOP: Emoji<'_, '_> = Emoji("🛑 ", "[STOP]");

// Session indicators
pub static SEARCH: Emoji<'_, '_> = Emoji("🔍 ", "[>]");
pub static CLOCK: Emoji<'_, '_> = Emoji("⏱️  ", "[T]");
pub static BUG: Emoji<'_, '_> = Emoji("🐛 ", "[BUG]");
pub static CHART: Emoji<'_, '_> = Emoji("📊 ", "[STATS]");
