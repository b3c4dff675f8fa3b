/// The notifications feed has no network contract; it ships a static sample
/// feed.
struct Notification {
    who: &'static str,
    what: &'static str,
    message: &'static str,
    age: &'static str,
}

const FEED: &[Notification] = &[
    Notification {
        who: "John Smith",
        what: "found a trial - 1234",
        message: "Great opportunity, check it out!",
        age: "2h",
    },
    Notification {
        who: "Emily Johnson",
        what: "found a trial - 5678",
        message: "This could be helpful!",
        age: "3h",
    },
];

const FILTER_CATEGORIES: &[&str] = &[
    "Comments",
    "Matches",
    "Reviews",
    "Mentions",
    "Updates",
    "Messages",
];

pub fn show() -> anyhow::Result<()> {
    println!("Notifications");
    println!();
    println!("New matches");
    for entry in FEED {
        println!("  {} {} ({} ago)", entry.who, entry.what, entry.age);
        println!("    {}", entry.message);
    }
    println!();
    println!("Filter categories: {}", FILTER_CATEGORIES.join(", "));
    Ok(())
}
