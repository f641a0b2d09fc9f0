use std::io::{self, IsTerminal};

use crate::app::{
    CalendarView, DecorateView, LaunchView, MonthView, PushView, RewardStatusView, StatsView,
};
use crate::domain::record::{Record, RecordContentType};
use crate::domain::reward::{Reward, RewardsByCategory};
use crate::flags::FlagEntry;

pub fn print_launch(view: &LaunchView) {
    let palette = Palette::auto();
    if let Some(version) = view.required_version.as_deref() {
        println!(
            "{} {}",
            palette.warn("update required:"),
            format_args!("version {version} is needed to continue")
        );
        return;
    }
    let greeting = if view.onboarded { "welcome" } else { "welcome back" };
    println!("{}, {}", greeting, palette.name(&view.user_name));
    println!(
        "{}",
        palette.dim(&format!("{} record(s) this month", view.records_this_month))
    );
    if view.new_star_bottle {
        println!("{}", palette.heading("a new star bottle is waiting for this month"));
    }
}

pub fn print_record(record: &Record) {
    let palette = Palette::auto();
    println!("{} {}", palette.heading("saved"), palette.day(&record.day.to_string()));
    print_record_body(record, &palette);
}

pub fn print_month(view: &MonthView) {
    let palette = Palette::auto();
    println!(
        "{}",
        palette.heading(&format!("{}-{:02}", view.day.year, view.day.month))
    );
    if view.records.is_empty() {
        println!("{}", palette.dim("no records yet"));
        return;
    }
    let mut records: Vec<&Record> = view.records.iter().collect();
    records.sort_by(|a, b| b.day.cmp(&a.day));
    for record in records {
        println!("{}", palette.day(&record.day.to_string()));
        print_record_body(record, &palette);
    }
    println!("{}", palette.dim(&format!("{} record(s)", view.records.len())));
}

fn print_record_body(record: &Record, palette: &Palette) {
    if record.is_empty_marker() {
        println!("  {}", palette.dim("no spending"));
        return;
    }
    for content in record.contents() {
        let memo = if content.memo.is_empty() {
            String::new()
        } else {
            format!(" {}", content.memo)
        };
        println!(
            "  {} {}{}",
            palette.flag(content.flag),
            content.category.title(),
            memo
        );
    }
}

pub fn print_statistics(view: &StatsView) {
    let palette = Palette::auto();
    println!(
        "{}",
        palette.heading(&format!("{}-{:02} statistics", view.year, view.month))
    );
    if view.good.is_empty() && view.bad.is_empty() {
        println!("{}", palette.dim("no records this month"));
        return;
    }
    for (flag, counts) in [
        (RecordContentType::Good, &view.good),
        (RecordContentType::Bad, &view.bad),
    ] {
        println!("{}", palette.flag(flag));
        for count in counts {
            println!("  {:<8} {}", count.title, count.count);
        }
    }
}

pub fn print_calendar(view: &CalendarView) {
    let palette = Palette::auto();
    println!("{}", palette.heading(&format!("{} star bottles", view.year)));
    for month in &view.months {
        let stars = match month.stars {
            Some(0) => palette.dim("empty"),
            Some(stars) => "*".repeat(stars as usize),
            None => palette.dim("-"),
        };
        println!("  {:>2}  {}", month.month, stars);
    }
}

pub fn print_reward_status(view: &RewardStatusView) {
    let palette = Palette::auto();
    println!("{}", palette.heading(&view.title));
    if !view.sub_title.is_empty() {
        println!("{}", view.sub_title);
    }
    println!(
        "{}",
        palette.dim(&format!(
            "{} record(s) toward feedback, {} gift(s) unopened",
            view.record_count, view.not_opened
        ))
    );
}

pub fn print_rewards(rewards: &[Reward]) {
    let palette = Palette::auto();
    if rewards.is_empty() {
        println!("{}", palette.dim("no gifts to open"));
        return;
    }
    for reward in rewards {
        println!("{}", format_reward(reward, &palette));
    }
}

pub fn print_owned(owned: &RewardsByCategory) {
    let palette = Palette::auto();
    if owned.is_empty() {
        println!("{}", palette.dim("no items cached; run `donmani init` first"));
        return;
    }
    for (category, items) in owned {
        println!("{}", palette.heading(category.as_str()));
        for item in items {
            println!("  {}", format_reward(item, &palette));
        }
    }
}

pub fn print_decoration(view: &DecorateView) {
    let palette = Palette::auto();
    if !view.changed {
        println!("{}", palette.dim("already equipped"));
    }
    for item in &view.equipped {
        println!("{}", format_reward(item, &palette));
    }
}

fn format_reward(reward: &Reward, palette: &Palette) -> String {
    let mut line = format!(
        "{} {} {}",
        palette.id(&reward.id.to_string()),
        reward.name,
        palette.category(reward.category.as_str())
    );
    if reward.is_unread_hidden() {
        line.push(' ');
        line.push_str(&palette.warn("new"));
    }
    line
}

pub fn print_flags(entries: &[FlagEntry]) {
    let palette = Palette::auto();
    for entry in entries {
        let value = if entry.is_default {
            palette.dim(&entry.value)
        } else {
            entry.value.clone()
        };
        println!("{:<40} {:<5} {}", entry.key, entry.kind, value);
    }
}

pub fn print_push(view: &PushView) {
    let palette = Palette::auto();
    let target = match (view.screen, view.day) {
        (Some(screen), Some(day)) => format!("{screen} for {day}"),
        (Some(screen), None) => screen.to_string(),
        (None, _) => view.route.to_string(),
    };
    println!("{} -> {}", palette.id(view.destination.as_str()), target);
    if view.already_written {
        println!("{}", palette.dim("both days are recorded already"));
    }
}

struct Palette {
    enabled: bool,
}

impl Palette {
    fn auto() -> Self {
        let enabled = std::env::var_os("NO_COLOR").is_none() && io::stdout().is_terminal();
        Self { enabled }
    }

    fn paint(&self, code: &str, text: &str) -> String {
        if self.enabled {
            format!("\x1b[{code}m{text}\x1b[0m")
        } else {
            text.to_string()
        }
    }

    fn heading(&self, text: &str) -> String {
        self.paint("1;36", text)
    }

    fn dim(&self, text: &str) -> String {
        self.paint("2", text)
    }

    fn id(&self, text: &str) -> String {
        self.paint("1;94", text)
    }

    fn day(&self, text: &str) -> String {
        self.paint("1", text)
    }

    fn name(&self, text: &str) -> String {
        self.paint("1;33", text)
    }

    fn warn(&self, text: &str) -> String {
        self.paint("1;31", text)
    }

    fn category(&self, text: &str) -> String {
        self.paint("35", &format!("({text})"))
    }

    fn flag(&self, flag: RecordContentType) -> String {
        self.paint(flag_color_code(flag), &format!("[{}]", flag.title()))
    }
}

fn flag_color_code(flag: RecordContentType) -> &'static str {
    match flag {
        RecordContentType::Good => "32",
        RecordContentType::Bad => "31",
    }
}

#[cfg(test)]
mod tests {
    use super::{format_reward, Palette};
    use crate::domain::record::RecordContentType;
    use crate::domain::reward::{Reward, RewardCategory};

    fn reward(hidden: bool) -> Reward {
        Reward {
            id: 9,
            category: RewardCategory::Decoration,
            name: "달".to_string(),
            image_url: None,
            json_url: None,
            sound_url: None,
            hidden,
            hidden_read: false,
        }
    }

    #[test]
    fn plain_palette_leaves_text_alone() {
        let palette = Palette { enabled: false };
        assert_eq!(palette.flag(RecordContentType::Good), "[행복]");
        assert_eq!(format_reward(&reward(false), &palette), "9 달 (decoration)");
        assert_eq!(format_reward(&reward(true), &palette), "9 달 (decoration) new");
    }

    #[test]
    fn colored_palette_wraps_in_ansi_codes() {
        let palette = Palette { enabled: true };
        assert_eq!(palette.flag(RecordContentType::Bad), "\x1b[31m[후회]\x1b[0m");
    }
}
