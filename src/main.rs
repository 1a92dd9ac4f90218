use std::path::PathBuf;

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod aggregate;
mod announcements;
mod checklist;
mod config;
mod embed;
mod export;
mod models;
mod quiz;
mod report;
mod shifts;
mod store;
mod videos;

use crate::config::PortalConfig;
use crate::models::{
    Announcement, ChecklistItem, ChecklistResponse, NewTestResponse, Priority, ShiftEntry,
    ShiftPdfLink, ShiftVacancy, TestQuestion, TestResponse, Video, VideoView,
};
use crate::store::{ListQuery, RecordStore, Table, ADMIN_LIMIT, EXPORT_LIMIT, LISTING_LIMIT};

#[derive(Parser)]
#[command(name = "staff-portal")]
#[command(about = "Store operations staff portal: announcements, training, checklists, quiz and shifts", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Staff activity logs kept by the portal.
#[derive(Clone, Copy, ValueEnum)]
enum LogKind {
    Checklist,
    Tests,
    Videos,
}

impl LogKind {
    fn unit(self) -> &'static str {
        match self {
            LogKind::Checklist => "submissions",
            LogKind::Tests => "attempts",
            LogKind::Videos => "views",
        }
    }

    fn default_file(self) -> PathBuf {
        PathBuf::from(match self {
            LogKind::Checklist => "checklist-responses.csv",
            LogKind::Tests => "test-results.csv",
            LogKind::Videos => "video-views.csv",
        })
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Normalize a pasted video link or embed snippet
    Embed { input: String },
    /// List training videos with their player URLs
    Videos {
        #[arg(long)]
        category: Option<String>,
    },
    /// Open a training video and log the view
    Watch {
        #[arg(long)]
        video: String,
        #[arg(long, env = "PORTAL_USER")]
        user: String,
    },
    /// Register a training video from a link or embed snippet
    AddVideo {
        #[arg(long)]
        title: String,
        /// Embed code or link as copied from the video site
        #[arg(long = "embed")]
        embed_code: String,
        #[arg(long)]
        category: String,
        #[arg(long, default_value_t = 1)]
        order: i64,
        /// Custom thumbnail; defaults to the video's own preview image
        #[arg(long)]
        thumbnail: Option<String>,
    },
    /// Delete a training video
    RemoveVideo {
        #[arg(long)]
        video: String,
    },
    /// Show announcements, pinned first
    Announcements,
    /// Post an announcement
    AddAnnouncement {
        #[arg(long)]
        title: String,
        #[arg(long)]
        content: String,
        #[arg(long, value_enum, default_value_t = Priority::Low)]
        priority: Priority,
        /// Keep it above unpinned announcements
        #[arg(long)]
        pinned: bool,
    },
    /// Delete an announcement
    RemoveAnnouncement {
        #[arg(long)]
        id: String,
    },
    /// Show the recent activity feed
    Updates {
        #[arg(long, default_value_t = aggregate::RECENT_PER_SOURCE)]
        per_source: usize,
        #[arg(long, default_value_t = aggregate::RECENT_OVERALL)]
        limit: usize,
    },
    /// Rank staff by number of logged records
    Rank { kind: LogKind },
    /// List submitted records, newest first
    Responses { kind: LogKind },
    /// Export submitted records as CSV
    Export {
        kind: LogKind,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Generate a markdown digest
    Report {
        #[arg(long, default_value = "portal-report.md")]
        out: PathBuf,
    },
    /// Show checklist items grouped by category
    Checklist {
        #[arg(long)]
        category: Option<String>,
    },
    /// Add a checklist item
    AddChecklistItem {
        #[arg(long)]
        text: String,
        #[arg(long)]
        category: String,
        #[arg(long, default_value_t = 1)]
        order: i64,
    },
    /// Delete a checklist item by its category and text
    RemoveChecklistItem {
        #[arg(long)]
        category: String,
        #[arg(long)]
        text: String,
    },
    /// Submit a completed checklist
    SubmitChecklist {
        #[arg(long, env = "PORTAL_USER")]
        user: String,
        #[arg(long)]
        category: String,
        /// Item text of a completed item; repeat for each
        #[arg(long = "checked")]
        checked: Vec<String>,
    },
    /// Show the quiz, or grade and record an attempt when answers are given
    Quiz {
        #[arg(long, env = "PORTAL_USER")]
        user: Option<String>,
        /// Comma separated option indexes, `-` to skip a question
        #[arg(long)]
        answers: Option<String>,
        #[arg(long, default_value = "Staff knowledge check")]
        test_name: String,
    },
    /// Add a quiz question
    AddQuestion {
        #[arg(long)]
        question: String,
        /// Option label; repeat for each, in display order
        #[arg(long = "option", required = true)]
        options: Vec<String>,
        /// Index of the correct option, starting at 0
        #[arg(long)]
        correct: usize,
        #[arg(long, default_value_t = 1)]
        order: i64,
    },
    /// Delete a quiz question
    RemoveQuestion {
        #[arg(long)]
        id: String,
    },
    /// Show open shift slots and published shift schedules
    Shifts {
        #[arg(long, env = "PORTAL_USER")]
        user: Option<String>,
    },
    /// Enter an open shift slot
    EnterShift {
        #[arg(long)]
        vacancy: String,
        #[arg(long, env = "PORTAL_USER")]
        user: String,
    },
    /// Open a shift slot for entries
    AddVacancy {
        /// Shift date as YYYY-MM-DD
        #[arg(long)]
        date: NaiveDate,
        #[arg(long)]
        time: String,
        #[arg(long)]
        job: String,
        #[arg(long, default_value = "")]
        notes: String,
        /// Hourly wage in yen
        #[arg(long)]
        wage: i64,
    },
    /// Stop recruiting for a shift slot
    FillVacancy {
        #[arg(long)]
        vacancy: String,
    },
    /// Delete a shift slot together with its entries
    RemoveVacancy {
        #[arg(long)]
        vacancy: String,
    },
    /// Publish a shift schedule link
    AddShiftPdf {
        #[arg(long)]
        title: String,
        #[arg(long)]
        url: String,
        #[arg(long, default_value_t = 1)]
        order: i64,
    },
    /// Delete a shift schedule link
    RemoveShiftPdf {
        #[arg(long)]
        id: String,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("staff_portal=info,warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn connect() -> anyhow::Result<RecordStore> {
    let config = PortalConfig::from_env()?;
    RecordStore::new(&config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Embed { input } => {
            let reference = embed::normalize(&input);
            println!("{}", serde_json::to_string_pretty(&reference)?);
            if !reference.is_match() {
                println!("No video id found. Paste an <iframe> snippet, a youtube.com/watch?v= link or a youtu.be link.");
            }
        }
        Commands::Videos { category } => {
            let store = connect()?;
            let listed: Vec<Video> = store
                .list(Table::Videos, ListQuery::sorted_by(LISTING_LIMIT, "order_num"))
                .await?;

            println!("Categories: {}", videos::categories(&listed).join(", "));

            let shown: Vec<&Video> = listed
                .iter()
                .filter(|video| category.as_deref().map_or(true, |c| video.category == c))
                .collect();
            if shown.is_empty() {
                println!("No videos found.");
                return Ok(());
            }
            for video in shown {
                println!(
                    "{}. {} ({}) {}",
                    video.order_num,
                    video.title,
                    video.category,
                    videos::player_url(video)
                );
                if let Some(thumbnail) = videos::thumbnail(video) {
                    println!("  thumbnail: {thumbnail}");
                }
                println!("  id: {}", video.id);
            }
        }
        Commands::Watch { video, user } => {
            let store = connect()?;
            let listed: Vec<Video> = store
                .list(Table::Videos, ListQuery::new(ADMIN_LIMIT))
                .await?;
            let watched = listed
                .iter()
                .find(|candidate| candidate.id == video)
                .with_context(|| format!("no video with id {video}"))?;

            let record = videos::view_record(watched, &user, Utc::now())?;
            store.create(Table::VideoViews, &record).await?;
            info!(video = %watched.id, user = %record.user_name, "video view logged");
            println!("{}", watched.title);
            println!("{}?autoplay=1", videos::player_url(watched));
        }
        Commands::AddVideo {
            title,
            embed_code,
            category,
            order,
            thumbnail,
        } => {
            let record =
                videos::new_video(&title, &embed_code, &category, order, thumbnail.as_deref())?;
            let store = connect()?;
            store.create(Table::Videos, &record).await?;
            info!(url = %record.youtube_url, title = %record.title, "video registered");
            println!("Added {} ({}).", record.title, record.youtube_url);
        }
        Commands::RemoveVideo { video } => {
            let store = connect()?;
            store.delete(Table::Videos, &video).await?;
            info!(video = %video, "video removed");
            println!("Removed video {video}.");
        }
        Commands::Announcements => {
            let store = connect()?;
            let mut announcements: Vec<Announcement> = store
                .list(Table::Announcements, ListQuery::newest_first(LISTING_LIMIT))
                .await?;

            if announcements.is_empty() {
                println!("No announcements right now.");
                return Ok(());
            }

            report::pinned_first(&mut announcements);
            for announcement in &announcements {
                println!("- {}", report::announcement_line(announcement));
                if !announcement.content.trim().is_empty() {
                    println!("  {}", announcement.content.trim());
                }
                println!("  id: {}", announcement.id);
            }
        }
        Commands::AddAnnouncement {
            title,
            content,
            priority,
            pinned,
        } => {
            let record =
                announcements::new_announcement(&title, &content, priority, pinned, Utc::now())?;
            let store = connect()?;
            store.create(Table::Announcements, &record).await?;
            info!(title = %record.title, priority = priority.as_str(), "announcement posted");
            println!("Posted {}.", record.title);
        }
        Commands::RemoveAnnouncement { id } => {
            let store = connect()?;
            store.delete(Table::Announcements, &id).await?;
            info!(id = %id, "announcement removed");
            println!("Removed announcement {id}.");
        }
        Commands::Updates { per_source, limit } => {
            let store = connect()?;
            let sources = store.activity_sources(per_source).await;
            let updates = aggregate::merge_recent_activity(&sources, per_source, limit);

            if updates.is_empty() {
                println!("No recent updates.");
                return Ok(());
            }

            let now = Utc::now();
            for event in &updates {
                println!("- {}", report::update_line(event, now));
            }
        }
        Commands::Rank { kind } => {
            let store = connect()?;
            let query = ListQuery::new(ADMIN_LIMIT);
            let ranking = match kind {
                LogKind::Checklist => aggregate::rank_by_actor(
                    &store
                        .list::<ChecklistResponse>(Table::ChecklistResponses, query)
                        .await?,
                ),
                LogKind::Tests => aggregate::rank_by_actor(
                    &store
                        .list::<TestResponse>(Table::TestResponses, query)
                        .await?,
                ),
                LogKind::Videos => aggregate::rank_by_actor(
                    &store.list::<VideoView>(Table::VideoViews, query).await?,
                ),
            };

            if ranking.is_empty() {
                println!("No data yet.");
                return Ok(());
            }

            for (index, entry) in ranking.iter().enumerate() {
                println!("{}", report::ranking_line(index + 1, entry, kind.unit()));
            }
        }
        Commands::Responses { kind } => {
            let store = connect()?;
            let query = ListQuery::newest_first(ADMIN_LIMIT);
            let format = "%Y-%m-%d %H:%M";

            match kind {
                LogKind::Checklist => {
                    let records: Vec<ChecklistResponse> =
                        store.list(Table::ChecklistResponses, query).await?;
                    if records.is_empty() {
                        println!("No data yet.");
                    }
                    for record in &records {
                        let (checked, total) = checklist::tally(record)?;
                        println!(
                            "{} {} [{}] {}/{}",
                            record.submitted_at.unwrap_or(record.created_at).format(format),
                            record.user_name,
                            record.category,
                            checked,
                            total
                        );
                    }
                }
                LogKind::Tests => {
                    let records: Vec<TestResponse> =
                        store.list(Table::TestResponses, query).await?;
                    if records.is_empty() {
                        println!("No data yet.");
                    }
                    for record in &records {
                        println!(
                            "{} {} [{}] {}/{} ({}%)",
                            record.submitted_at.unwrap_or(record.created_at).format(format),
                            record.user_name,
                            record.test_name,
                            record.score,
                            record.total_questions,
                            quiz::percentage(record.score, record.total_questions)
                        );
                    }
                }
                LogKind::Videos => {
                    let records: Vec<VideoView> = store.list(Table::VideoViews, query).await?;
                    if records.is_empty() {
                        println!("No data yet.");
                    }
                    for record in &records {
                        println!(
                            "{} {} {}",
                            record.viewed_at.unwrap_or(record.created_at).format(format),
                            record.user_name,
                            record.video_title
                        );
                    }
                }
            }
        }
        Commands::Export { kind, out } => {
            let store = connect()?;
            let query = ListQuery::new(EXPORT_LIMIT);
            let table = match kind {
                LogKind::Checklist => export::checklist_table(
                    &store
                        .list::<ChecklistResponse>(Table::ChecklistResponses, query)
                        .await?,
                ),
                LogKind::Tests => {
                    export::test_table(&store.list::<TestResponse>(Table::TestResponses, query).await?)
                }
                LogKind::Videos => {
                    export::video_view_table(&store.list::<VideoView>(Table::VideoViews, query).await?)
                }
            };

            let out = out.unwrap_or_else(|| kind.default_file());
            export::write_csv_file(&out, &table)?;
            info!(rows = table.rows.len(), path = %out.display(), "csv exported");
            println!("Exported {} rows to {}.", table.rows.len(), out.display());
        }
        Commands::Report { out } => {
            let store = connect()?;
            let query = ListQuery::new(ADMIN_LIMIT);
            let (announcements, sources, tests, views) = tokio::join!(
                store.list::<Announcement>(
                    Table::Announcements,
                    ListQuery::newest_first(LISTING_LIMIT)
                ),
                store.activity_sources(aggregate::RECENT_PER_SOURCE),
                store.list::<TestResponse>(Table::TestResponses, query),
                store.list::<VideoView>(Table::VideoViews, query),
            );

            let updates = aggregate::merge_recent_activity(
                &sources,
                aggregate::RECENT_PER_SOURCE,
                aggregate::RECENT_OVERALL,
            );
            let report = report::build_report(
                &announcements?,
                &updates,
                &aggregate::rank_by_actor(&tests?),
                &aggregate::rank_by_actor(&views?),
                Utc::now(),
            );
            std::fs::write(&out, report)
                .with_context(|| format!("writing {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
        Commands::Checklist { category } => {
            let store = connect()?;
            let items: Vec<ChecklistItem> = store
                .list(Table::ChecklistItems, ListQuery::sorted_by(ADMIN_LIMIT, "order_num"))
                .await?;
            let groups = checklist::group_by_category(&items);

            let shown: Vec<_> = groups
                .iter()
                .filter(|group| category.as_deref().map_or(true, |c| group.category == c))
                .collect();
            if shown.is_empty() {
                println!("No checklist items for this category.");
                return Ok(());
            }
            for group in shown {
                println!("## {}", group.category);
                for item in &group.items {
                    println!("- [ ] {item}");
                }
            }
        }
        Commands::SubmitChecklist {
            user,
            category,
            checked,
        } => {
            let store = connect()?;
            let items: Vec<ChecklistItem> = store
                .list(Table::ChecklistItems, ListQuery::sorted_by(ADMIN_LIMIT, "order_num"))
                .await?;
            let groups = checklist::group_by_category(&items);
            let group = groups
                .iter()
                .find(|group| group.category == category)
                .with_context(|| format!("unknown checklist category {category:?}"))?;

            let submission = checklist::build_submission(&user, group, &checked, Utc::now())?;
            let (done, total) = checklist::submission_tally(&submission)?;
            store
                .create(Table::ChecklistResponses, &submission)
                .await?;
            println!("Checklist submitted: {done}/{total} items done.");
        }
        Commands::AddChecklistItem {
            text,
            category,
            order,
        } => {
            let record = checklist::new_item(&text, &category, order)?;
            let store = connect()?;
            store.create(Table::ChecklistItems, &record).await?;
            info!(category = %record.category, item = %record.item_text, "checklist item added");
            println!("Added {:?} to {}.", record.item_text, record.category);
        }
        Commands::RemoveChecklistItem { category, text } => {
            let store = connect()?;
            let items: Vec<ChecklistItem> = store
                .list(Table::ChecklistItems, ListQuery::new(ADMIN_LIMIT))
                .await?;
            let item = checklist::find_item(&items, &category, &text)
                .with_context(|| format!("no checklist item {text:?} in {category:?}"))?;

            store.delete(Table::ChecklistItems, &item.id).await?;
            info!(id = %item.id, category = %category, "checklist item removed");
            println!("Removed {:?} from {}.", text, category);
        }
        Commands::Quiz {
            user,
            answers,
            test_name,
        } => {
            let store = connect()?;
            let records: Vec<TestQuestion> = store
                .list(Table::TestQuestions, ListQuery::sorted_by(ADMIN_LIMIT, "order_num"))
                .await?;
            let questions = records
                .iter()
                .map(quiz::Question::from_record)
                .collect::<anyhow::Result<Vec<_>>>()?;

            if questions.is_empty() {
                println!("No quiz questions yet.");
                return Ok(());
            }

            let Some(raw_answers) = answers else {
                for (index, (question, record)) in questions.iter().zip(&records).enumerate() {
                    println!("Q{}. {} [id: {}]", index + 1, question.prompt, record.id);
                    for (option_index, option) in question.options.iter().enumerate() {
                        println!("  {option_index}) {option}");
                    }
                }
                return Ok(());
            };

            let user = user.context("--user or PORTAL_USER is required to record an attempt")?;
            let answers = quiz::parse_answers(&raw_answers)?;
            let outcome = quiz::grade(&questions, &answers)?;

            let record = NewTestResponse {
                user_name: user,
                test_name,
                score: outcome.score,
                total_questions: outcome.total,
                responses: quiz::encode_answers(&answers)?,
                submitted_at: Utc::now(),
            };
            store.create(Table::TestResponses, &record).await?;

            println!(
                "{} / {} correct ({}%). {}",
                outcome.score,
                outcome.total,
                outcome.percentage,
                outcome.verdict.message()
            );
        }
        Commands::AddQuestion {
            question,
            options,
            correct,
            order,
        } => {
            let record = quiz::new_question(&question, &options, correct, order)?;
            let store = connect()?;
            store.create(Table::TestQuestions, &record).await?;
            info!(question = %record.question, options = options.len(), "quiz question added");
            println!("Added question {:?}.", record.question);
        }
        Commands::RemoveQuestion { id } => {
            let store = connect()?;
            store.delete(Table::TestQuestions, &id).await?;
            info!(id = %id, "quiz question removed");
            println!("Removed question {id}.");
        }
        Commands::Shifts { user } => {
            let store = connect()?;
            let (vacancies, entries, links) = tokio::try_join!(
                store.list::<ShiftVacancy>(
                    Table::ShiftVacancies,
                    ListQuery::sorted_by(LISTING_LIMIT, "shift_date")
                ),
                store.list::<ShiftEntry>(Table::ShiftEntries, ListQuery::new(ADMIN_LIMIT)),
                store.list::<ShiftPdfLink>(
                    Table::ShiftPdfLinks,
                    ListQuery::sorted_by(LISTING_LIMIT, "display_order")
                ),
            )?;

            let boards = shifts::attach_entries(vacancies, &entries);
            println!("## Open shifts");
            if boards.is_empty() {
                println!("No open shifts right now.");
            }
            for board in &boards {
                let vacancy = &board.vacancy;
                println!(
                    "- {} {} {} {} [{}]",
                    vacancy.shift_date.format("%b %-d (%a)"),
                    vacancy.time_slot,
                    shifts::format_wage(vacancy.hourly_wage),
                    vacancy.job_description,
                    board.status_for(user.as_deref()).as_str()
                );
                if !vacancy.notes.trim().is_empty() {
                    println!("  note: {}", vacancy.notes.trim());
                }
                let names = board.entrant_names();
                if !names.is_empty() {
                    println!("  entries: {} ({})", names.join(", "), names.len());
                }
                println!("  id: {}", vacancy.id);
            }

            println!();
            println!("## Shift schedules");
            if links.is_empty() {
                println!("No shift schedules published.");
            }
            for link in &links {
                println!("- {}: {} [id: {}]", link.title, link.pdf_url, link.id);
            }
        }
        Commands::EnterShift { vacancy, user } => {
            let store = connect()?;
            let (vacancies, entries) = tokio::try_join!(
                store.list::<ShiftVacancy>(Table::ShiftVacancies, ListQuery::new(ADMIN_LIMIT)),
                store.list::<ShiftEntry>(Table::ShiftEntries, ListQuery::new(ADMIN_LIMIT)),
            )?;

            let boards = shifts::attach_entries(vacancies, &entries);
            let board = boards
                .iter()
                .find(|board| board.vacancy.id == vacancy)
                .with_context(|| format!("no shift slot with id {vacancy}"))?;

            let record = shifts::prepare_entry(board, &user, Utc::now())?;
            store.create(Table::ShiftEntries, &record).await?;
            info!(vacancy = %vacancy, user = %user, "shift entry recorded");
            println!(
                "Entered the {} {} shift; an administrator will confirm.",
                board.vacancy.shift_date, board.vacancy.time_slot
            );
        }
        Commands::AddVacancy {
            date,
            time,
            job,
            notes,
            wage,
        } => {
            let record = shifts::new_vacancy(date, &time, &job, &notes, wage, Utc::now())?;
            let store = connect()?;
            store.create(Table::ShiftVacancies, &record).await?;
            info!(date = %record.shift_date, slot = %record.time_slot, "shift slot opened");
            println!(
                "Opened {} {} at {}.",
                record.shift_date,
                record.time_slot,
                shifts::format_wage(record.hourly_wage)
            );
        }
        Commands::FillVacancy { vacancy } => {
            let store = connect()?;
            let vacancies: Vec<ShiftVacancy> = store
                .list(Table::ShiftVacancies, ListQuery::new(ADMIN_LIMIT))
                .await?;
            let slot = vacancies
                .iter()
                .find(|slot| slot.id == vacancy)
                .with_context(|| format!("no shift slot with id {vacancy}"))?;

            let replacement = shifts::mark_filled(slot, Utc::now());
            store
                .replace(Table::ShiftVacancies, &vacancy, &replacement)
                .await?;
            info!(vacancy = %vacancy, "shift slot closed");
            println!(
                "Closed recruiting for {} {}.",
                slot.shift_date, slot.time_slot
            );
        }
        Commands::RemoveVacancy { vacancy } => {
            let store = connect()?;
            let entries: Vec<ShiftEntry> = store
                .list(Table::ShiftEntries, ListQuery::new(ADMIN_LIMIT))
                .await?;

            let mut removed = 0usize;
            for entry in entries.iter().filter(|entry| entry.vacancy_id == vacancy) {
                store.delete(Table::ShiftEntries, &entry.id).await?;
                removed += 1;
            }
            store.delete(Table::ShiftVacancies, &vacancy).await?;
            info!(vacancy = %vacancy, entries = removed, "shift slot removed");
            println!("Removed shift slot {vacancy} and {removed} entries.");
        }
        Commands::AddShiftPdf { title, url, order } => {
            let record = shifts::new_pdf_link(&title, &url, order, Utc::now())?;
            let store = connect()?;
            store.create(Table::ShiftPdfLinks, &record).await?;
            info!(title = %record.title, "shift schedule published");
            println!("Published {}.", record.title);
        }
        Commands::RemoveShiftPdf { id } => {
            let store = connect()?;
            store.delete(Table::ShiftPdfLinks, &id).await?;
            info!(id = %id, "shift schedule removed");
            println!("Removed shift schedule {id}.");
        }
    }

    Ok(())
}
