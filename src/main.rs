use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use yks_rankings::catalog::{self, Catalog};
use yks_rankings::export::write_items_csv;
use yks_rankings::lists::{ListSettings, ListStore, PersonalList};
use yks_rankings::loader::CatalogLoader;
use yks_rankings::models::{CatalogItem, Config};
use yks_rankings::query::{QueryFilter, QuerySort, SortKey, SortOrder};
use yks_rankings::storage::FileStore;

fn cli() -> Command {
    let text_arg = |name: &'static str, help: &'static str| {
        Arg::new(name).long(name).value_name("TEXT").help(help)
    };

    Command::new("yks-rankings")
        .version("1.0")
        .about("Browse, filter and organize university program admission rankings")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path")
                .default_value("config.toml"),
        )
        .subcommand_required(true)
        .subcommand(
            Command::new("query")
                .about("Filter, sort and page through the rankings")
                .arg(text_arg("search", "Match university, department or faculty name"))
                .arg(text_arg("score-type", "Exact score type code, e.g. SAY"))
                .arg(text_arg("city", "City name substring"))
                .arg(text_arg("university", "University name substring"))
                .arg(text_arg("department", "Department name substring"))
                .arg(Arg::new("year").long("year").value_parser(value_parser!(u16)))
                .arg(Arg::new("min-score").long("min-score").value_parser(value_parser!(f64)))
                .arg(Arg::new("max-score").long("max-score").value_parser(value_parser!(f64)))
                .arg(Arg::new("min-rank").long("min-rank").value_parser(value_parser!(u32)))
                .arg(Arg::new("max-rank").long("max-rank").value_parser(value_parser!(u32)))
                .arg(
                    Arg::new("sort-by")
                        .long("sort-by")
                        .value_parser(value_parser!(SortKey))
                        .help("score, rank, quota, year, university or department"),
                )
                .arg(
                    Arg::new("order")
                        .long("order")
                        .value_parser(value_parser!(SortOrder))
                        .help("asc or desc"),
                )
                .arg(
                    Arg::new("page")
                        .long("page")
                        .value_parser(value_parser!(usize))
                        .default_value("0"),
                )
                .arg(
                    Arg::new("all")
                        .long("all")
                        .action(ArgAction::SetTrue)
                        .help("Follow the cursor through every page"),
                )
                .arg(
                    Arg::new("csv")
                        .long("csv")
                        .value_name("PATH")
                        .value_parser(value_parser!(PathBuf))
                        .help("Also write the results as CSV"),
                ),
        )
        .subcommand(
            Command::new("details")
                .about("Show one program in detail")
                .arg(Arg::new("id").required(true)),
        )
        .subcommand(Command::new("options").about("List the available filter values"))
        .subcommand(
            Command::new("lists")
                .about("Manage personal lists")
                .subcommand_required(true)
                .subcommand(Command::new("show").arg(Arg::new("id")))
                .subcommand(Command::new("create").arg(Arg::new("name").required(true)))
                .subcommand(Command::new("delete").arg(Arg::new("id").required(true)))
                .subcommand(
                    Command::new("rename")
                        .arg(Arg::new("id").required(true))
                        .arg(Arg::new("name").required(true)),
                )
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("id").required(true))
                        .arg(Arg::new("item").required(true)),
                )
                .subcommand(
                    Command::new("remove")
                        .arg(Arg::new("id").required(true))
                        .arg(Arg::new("item").required(true)),
                )
                .subcommand(Command::new("containing").arg(Arg::new("item").required(true)))
                .subcommand(
                    Command::new("export")
                        .arg(Arg::new("id").required(true))
                        .arg(Arg::new("path").required(true).value_parser(value_parser!(PathBuf))),
                ),
        )
        .subcommand(
            Command::new("favorite")
                .about("Toggle a program in the favorites list")
                .arg(Arg::new("item").required(true)),
        )
        .subcommand(Command::new("favorites").about("Show the favorites list"))
        .subcommand(
            Command::new("history")
                .about("Show recent searches")
                .arg(Arg::new("clear").long("clear").action(ArgAction::SetTrue)),
        )
}

fn init_logging(config: &Config) {
    let Some(path) = &config.log_file else {
        return;
    };
    let level = LevelFilter::from_str(&config.log_level).unwrap_or(LevelFilter::Info);
    let log_config = ConfigBuilder::new().set_time_format_rfc3339().build();

    match open_log_file(path) {
        Ok(log_file) => {
            let _ = WriteLogger::init(level, log_config, log_file);
        }
        Err(e) => eprintln!("⚠️  Logging disabled: {:#}", e),
    }
}

fn open_log_file(path: &str) -> Result<File> {
    File::create(path).with_context(|| format!("Failed to create log file: {}", path))
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = cli().get_matches();
    let config_file = matches
        .get_one::<String>("config")
        .map(String::as_str)
        .unwrap_or("config.toml");

    let config = if Path::new(config_file).exists() {
        Config::load_from_file(config_file)?
    } else {
        println!("📝 Creating default configuration file: {}", config_file);
        let default_config = Config::default();
        default_config.save_to_file(config_file)?;
        default_config
    };

    init_logging(&config);
    log::info!("Starting with data source {:?}", config.data_source_mode);

    let loader = CatalogLoader::new(config.default_year);
    let items = loader.load_configured(&config).await?;
    let catalog = catalog::install(Catalog::from_items(items))?;

    let settings = ListSettings {
        default_list_name: config.default_list_name.clone(),
        favorites_list_name: config.favorites_list_name.clone(),
    };
    let store = FileStore::new(config.resolved_storage_directory());
    let mut lists = ListStore::open(Arc::new(store), settings);

    match matches.subcommand() {
        Some(("query", args)) => run_query(catalog, &mut lists, args)?,
        Some(("details", args)) => show_details(catalog, required(args, "id")),
        Some(("options", _)) => show_options(catalog),
        Some(("lists", args)) => run_lists(catalog, &mut lists, args)?,
        Some(("favorite", args)) => {
            let id = required(args, "item");
            match catalog.get(id) {
                Some(item) => {
                    if lists.toggle_favorite(item) {
                        println!("⭐ Added {} to favorites", id);
                    } else {
                        println!("☆ Removed {} from favorites", id);
                    }
                }
                None => println!("❌ Ranking not found: {}", id),
            }
        }
        Some(("favorites", _)) => print_items(lists.favorites()),
        Some(("history", args)) => {
            if args.get_flag("clear") {
                lists.clear_history();
                println!("🧹 Search history cleared");
            } else if lists.recent_searches().is_empty() {
                println!("No recent searches");
            } else {
                for (i, search) in lists.recent_searches().iter().enumerate() {
                    println!("   {}. {}", i + 1, search);
                }
            }
        }
        _ => {}
    }

    Ok(())
}

fn required<'a>(args: &'a ArgMatches, name: &str) -> &'a str {
    args.get_one::<String>(name).map(String::as_str).unwrap_or_default()
}

fn text_filter(args: &ArgMatches, name: &str) -> Option<String> {
    args.get_one::<String>(name).cloned()
}

fn run_query(catalog: &Catalog, lists: &mut ListStore, args: &ArgMatches) -> Result<()> {
    let filter = QueryFilter {
        search_query: text_filter(args, "search"),
        score_type: text_filter(args, "score-type"),
        city: text_filter(args, "city"),
        university: text_filter(args, "university"),
        department: text_filter(args, "department"),
        year: args.get_one::<u16>("year").copied(),
        min_score: args.get_one::<f64>("min-score").copied(),
        max_score: args.get_one::<f64>("max-score").copied(),
        min_rank: args.get_one::<u32>("min-rank").copied(),
        max_rank: args.get_one::<u32>("max-rank").copied(),
    };
    let sort = QuerySort {
        sort_by: args.get_one::<SortKey>("sort-by").copied().unwrap_or_default(),
        sort_order: args.get_one::<SortOrder>("order").copied().unwrap_or_default(),
    };

    if let Some(search) = &filter.search_query {
        lists.add_recent_search(search);
    }

    let mut page = args.get_one::<usize>("page").copied().unwrap_or(0);
    let mut collected: Vec<CatalogItem> = Vec::new();
    let mut next_cursor;
    loop {
        let result = catalog.query(&filter, sort, page);
        collected.extend(result.items);
        next_cursor = result.next_cursor;
        match next_cursor {
            Some(next) if args.get_flag("all") => page = next,
            _ => break,
        }
    }

    println!("🔍 Sorted by {} ({:?})", sort.sort_by, sort.sort_order);
    print_items(&collected);
    if let Some(next) = next_cursor {
        println!("➡️  More results: --page {}", next);
    }

    if let Some(path) = args.get_one::<PathBuf>("csv") {
        write_items_csv(path, &collected)?;
        println!("📄 Wrote {} rows to {}", collected.len(), path.display());
    }
    Ok(())
}

fn print_items(items: &[CatalogItem]) {
    if items.is_empty() {
        println!("No programs found");
        return;
    }
    for item in items {
        println!(
            "   [{}] {} / {} ({})\n      {} · score {:.2} · rank {} · quota {} · {}",
            item.id,
            item.university_name,
            item.department_name,
            item.city,
            item.score_type,
            item.score,
            item.rank,
            item.quota,
            item.year,
        );
    }
}

fn show_details(catalog: &Catalog, id: &str) {
    match catalog.details(id) {
        Ok(detail) => {
            print_items(std::slice::from_ref(&detail.item));
            println!("   Faculty: {}", detail.item.faculty);
            if let Some(description) = &detail.description {
                println!("   {}", description);
            }
            if let Some(website) = &detail.website {
                println!("   🌐 {}", website);
            }
            if let Some(email) = &detail.contact_email {
                println!("   ✉️  {}", email);
            }
            for entry in &detail.history {
                println!("   {}: score {:.2}, rank {}", entry.year, entry.score, entry.rank);
            }
        }
        Err(e) => println!("❌ {}", e),
    }
}

fn show_options(catalog: &Catalog) {
    let options = catalog.filter_options();
    let years: Vec<String> = options.years.iter().map(u16::to_string).collect();
    println!("📅 Years: {}", years.join(", "));
    println!("📝 Score types: {}", options.score_types.join(", "));
    println!("🏙️  Cities: {}", options.cities.join(", "));
    println!("🏛️  Universities: {}", options.universities.len());
    println!("📚 Departments: {}", options.departments.len());
}

fn print_list(list: &PersonalList) {
    println!("📋 {} [{}] - {} programs", list.name, list.id, list.items.len());
}

fn run_lists(catalog: &Catalog, lists: &mut ListStore, args: &ArgMatches) -> Result<()> {
    match args.subcommand() {
        Some(("show", sub)) => match sub.get_one::<String>("id") {
            Some(id) => match lists.list(id) {
                Some(list) => {
                    print_list(list);
                    print_items(&list.items);
                }
                None => println!("❌ List not found: {}", id),
            },
            None => {
                if lists.lists().is_empty() {
                    println!("No personal lists yet");
                }
                for list in lists.lists() {
                    print_list(list);
                }
            }
        },
        Some(("create", sub)) => {
            let id = lists.create_list(required(sub, "name"));
            println!("✅ Created list {}", id);
        }
        Some(("delete", sub)) => {
            lists.delete_list(required(sub, "id"));
            println!("🗑️  Deleted list {}", required(sub, "id"));
        }
        Some(("rename", sub)) => {
            lists.update_list_name(required(sub, "id"), required(sub, "name"));
            if let Some(list) = lists.list(required(sub, "id")) {
                print_list(list);
            }
        }
        Some(("add", sub)) => {
            let item_id = required(sub, "item");
            match catalog.get(item_id) {
                Some(item) => {
                    lists.add_item_to_list(required(sub, "id"), item);
                    println!("✅ {} is in list: {}", item_id, lists.is_item_in_list(required(sub, "id"), item_id));
                }
                None => println!("❌ Ranking not found: {}", item_id),
            }
        }
        Some(("remove", sub)) => {
            lists.remove_item_from_list(required(sub, "id"), required(sub, "item"));
            println!("🗑️  Removed {}", required(sub, "item"));
        }
        Some(("containing", sub)) => {
            for list in lists.lists_containing_item(required(sub, "item")) {
                print_list(list);
            }
        }
        Some(("export", sub)) => {
            let id = required(sub, "id");
            let path = sub.get_one::<PathBuf>("path").cloned().unwrap_or_default();
            match lists.list(id) {
                Some(list) => {
                    write_items_csv(&path, &list.items)?;
                    println!("📄 Wrote {} rows to {}", list.items.len(), path.display());
                }
                None => println!("❌ List not found: {}", id),
            }
        }
        _ => {}
    }
    Ok(())
}
