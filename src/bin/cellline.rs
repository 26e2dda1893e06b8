//! Cellline CLI — register cultures, passage them, and walk their lineage
//!
//! Commands:
//!   cellline register  — register a founding culture
//!   cellline passage   — harvest a culture and seed the next generation
//!   cellline list      — list all cultures
//!   cellline lineage   — show a culture and all of its descendants
//!   cellline edges     — parent/child edges for graph tools
//!   cellline delete    — delete a culture without children
//!   cellline stats     — show store statistics
//!   cellline snapshot  — create/list/restore/verify document snapshots

use cellline_core::config::{parse_hours, DEFAULT_HOURS};
use cellline_core::culture::edges;
use cellline_core::storage::backup::SnapshotManager;
use cellline_core::{
    delete_culture, register_passage, CultureRecord, CultureStore, NewCulture, PassageRequest,
    StoreConfig,
};
use std::env;
use std::str::FromStr;

fn print_usage() {
    println!(
        r#"
Cellline — cell culture lineage manager

Usage: cellline <command> [options]

Commands:
  register <cell_type> <passage> <seeded> [label]             Register a founding culture
  passage  <parent> <harvested> <next_seeded> [hours] [label] Passage a culture (hours default 48)
  list                                                        List all cultures
  lineage  <root>                                             Show a culture and its descendants
  edges    [root]                                             Print parent -> child edges
  delete   <id>                                               Delete a culture without children
  stats                                                       Show store statistics
  snapshot [create [desc]|list|restore [<ver>|latest]|verify] Snapshot management

Ids may be given as any unique prefix.

Environment:
  CELLLINE_DATA_FILE       culture document (default cells.json)
  CELLLINE_BACKUP_DIR      snapshot directory (default cellline-backups)
  CELLLINE_KEEP_SNAPSHOTS  snapshots kept after each create (default 20)

Examples:
  cellline register HeLa 5 500000 "Lot.3"
  cellline passage 3f2a 2000000 500000 48 "P6 GFP+"
  cellline lineage 3f2a
"#
    );
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        print_usage();
        return;
    }

    let config = StoreConfig::from_env();
    match args[1].as_str() {
        "register" => cmd_register(&config, &args[2..]),
        "passage" => cmd_passage(&config, &args[2..]),
        "list" => cmd_list(&config),
        "lineage" => cmd_lineage(&config, &args[2..]),
        "edges" => cmd_edges(&config, &args[2..]),
        "delete" => cmd_delete(&config, &args[2..]),
        "stats" => cmd_stats(&config),
        "snapshot" => cmd_snapshot(&config, &args[2..]),
        "help" | "--help" | "-h" => print_usage(),
        other => {
            eprintln!("Unknown command: {}", other);
            print_usage();
        }
    }
}

/// Open the store, warning on stderr if the document had to be discarded
fn load_store(config: &StoreConfig) -> CultureStore {
    let (store, report) = CultureStore::open(&config.data_file);
    if let Some(warning) = report.warning() {
        eprintln!("  WARNING: {}", warning);
    }
    store
}

fn parse_arg<T: FromStr>(value: &str, what: &str) -> Option<T> {
    match value.parse() {
        Ok(v) => Some(v),
        Err(_) => {
            eprintln!("  {} must be a number, got '{}'", what, value);
            None
        }
    }
}

fn print_record(record: &CultureRecord) {
    println!("  [{}] {}", record.id, record.summary());
}

fn cmd_register(config: &StoreConfig, args: &[String]) {
    if args.len() < 3 {
        eprintln!("Usage: cellline register <cell_type> <passage> <seeded> [label]");
        return;
    }
    let (Some(passage), Some(seeded)) = (
        parse_arg::<u32>(&args[1], "passage"),
        parse_arg::<u64>(&args[2], "seeded"),
    ) else {
        return;
    };
    let label = args.get(3).cloned().unwrap_or_default();

    let mut store = load_store(config);
    match store.create(NewCulture::root(args[0].clone(), label, passage, seeded)) {
        Ok(record) => {
            println!("\n  Registered culture:");
            print_record(&record);
        }
        Err(e) => eprintln!("  Failed to save: {}", e),
    }
}

fn cmd_passage(config: &StoreConfig, args: &[String]) {
    if args.len() < 3 {
        eprintln!("Usage: cellline passage <parent> <harvested> <next_seeded> [hours] [label]");
        return;
    }
    let (Some(harvested), Some(next_seeded)) = (
        parse_arg::<u64>(&args[1], "harvested"),
        parse_arg::<u64>(&args[2], "next_seeded"),
    ) else {
        return;
    };
    let hours = match args.get(3) {
        Some(raw) => match parse_hours(raw) {
            Some(h) => h,
            None => {
                eprintln!("  hours must be a finite number, got '{}'", raw);
                return;
            }
        },
        None => DEFAULT_HOURS,
    };
    let label = args.get(4).cloned().unwrap_or_default();

    let mut store = load_store(config);
    let parent_id = match store.resolve(&args[0]) {
        Ok(parent) => parent.id.clone(),
        Err(e) => {
            eprintln!("  {}", e);
            return;
        }
    };

    let request = PassageRequest::new(&parent_id, harvested, next_seeded, hours, label);
    match register_passage(&mut store, &request) {
        Ok(child) => {
            if let Some(parent) = store.find(&parent_id) {
                println!("\n  Harvested:");
                print_record(parent);
            }
            println!("  Next generation (P{}):", child.passage);
            print_record(&child);
        }
        Err(e) => eprintln!("  Passage failed: {}", e),
    }
}

fn cmd_list(config: &StoreConfig) {
    let store = load_store(config);
    if store.is_empty() {
        println!("\n  No cultures. Use 'cellline register' to get started.");
        return;
    }
    println!("\n  Cultures ({}):", store.len());
    println!("  {}", "-".repeat(80));
    for record in store.all() {
        print_record(record);
    }
}

fn cmd_lineage(config: &StoreConfig, args: &[String]) {
    let Some(prefix) = args.first() else {
        eprintln!("Usage: cellline lineage <root>");
        return;
    };
    let store = load_store(config);
    let root = match store.resolve(prefix) {
        Ok(root) => root,
        Err(e) => {
            eprintln!("  {}", e);
            return;
        }
    };

    let index = store.index();
    let lineage = index.lineage_of(&root.id);
    println!("\n  Lineage of {} ({} cultures):", root.id, lineage.len());
    for record in lineage {
        let depth = record.passage.saturating_sub(root.passage) as usize;
        println!("  {}[{}] {}", "  ".repeat(depth), record.id, record.summary());
    }
}

fn cmd_edges(config: &StoreConfig, args: &[String]) {
    let store = load_store(config);
    let index = store.index();
    let records: Vec<&CultureRecord> = match args.first() {
        Some(prefix) => match store.resolve(prefix) {
            Ok(root) => index.lineage_of(&root.id),
            Err(e) => {
                eprintln!("  {}", e);
                return;
            }
        },
        None => store.all().iter().collect(),
    };
    for record in &records {
        println!("{}\t{}", record.id, record.display_name());
    }
    for edge in edges(&records) {
        println!("{} -> {}", edge.parent_id, edge.child_id);
    }
}

fn cmd_delete(config: &StoreConfig, args: &[String]) {
    let Some(prefix) = args.first() else {
        eprintln!("Usage: cellline delete <id>");
        return;
    };
    let mut store = load_store(config);
    let id = match store.resolve(prefix) {
        Ok(record) => record.id.clone(),
        Err(e) => {
            eprintln!("  {}", e);
            return;
        }
    };
    match delete_culture(&mut store, &id) {
        Ok(removed) => println!("\n  Deleted {} ({})", removed.id, removed.display_name()),
        Err(e) => eprintln!("  {}", e),
    }
}

fn cmd_stats(config: &StoreConfig) {
    let store = load_store(config);
    println!("\n  {}", store.summary());
    let index = store.index();
    for root in index.roots() {
        let lineage = index.lineage_of(&root.id);
        let deepest = lineage.iter().map(|r| r.passage).max().unwrap_or(root.passage);
        let max_pdl = lineage.iter().map(|r| r.pdl).fold(0.0, f64::max);
        println!(
            "  {} '{}' [{}]: {} cultures, P{}..P{}, PDL up to {:.2}",
            root.cell_type,
            root.label,
            root.id,
            lineage.len(),
            root.passage,
            deepest,
            max_pdl
        );
    }
}

/// Open the snapshot directory, reporting a damaged manifest instead of starting over
fn open_snapshots(config: &StoreConfig) -> Option<SnapshotManager> {
    match SnapshotManager::open(&config.backup_dir) {
        Ok(snapshots) => Some(snapshots),
        Err(e) => {
            eprintln!(
                "  Cannot open snapshots in {}: {}",
                config.backup_dir.display(),
                e
            );
            None
        }
    }
}

fn cmd_snapshot(config: &StoreConfig, args: &[String]) {
    let subcmd = args.first().map(|s| s.as_str()).unwrap_or("create");
    let Some(mut snapshots) = open_snapshots(config) else {
        return;
    };

    match subcmd {
        "create" => {
            let store = load_store(config);
            let data = match store.to_json() {
                Ok(json) => json,
                Err(e) => {
                    eprintln!("  Failed to serialize: {}", e);
                    return;
                }
            };
            let desc = args.get(1).map(|s| s.as_str()).unwrap_or("manual snapshot");
            match snapshots.create_snapshot(&data, store.len(), desc) {
                Ok(meta) => {
                    println!(
                        "\n  Snapshot created: v{} ({} bytes, {} cultures)",
                        meta.version, meta.size_bytes, meta.record_count
                    );
                    println!("  Checksum: {}", &meta.checksum[..16]);
                    if let Err(e) = snapshots.retain_latest(config.keep_snapshots) {
                        eprintln!("  Failed to prune old snapshots: {}", e);
                    }
                }
                Err(e) => eprintln!("  Snapshot failed: {}", e),
            }
        }
        "list" => {
            let list = snapshots.list_snapshots();
            if list.is_empty() {
                println!("\n  No snapshots found. Run 'cellline snapshot create' first.");
                return;
            }
            println!("\n  Snapshots ({}):", list.len());
            println!("  {}", "-".repeat(70));
            for snap in list {
                println!(
                    "  v{:>4} | {} | {} cultures | {} bytes | {}",
                    snap.version,
                    snap.timestamp.format("%Y-%m-%d %H:%M:%S"),
                    snap.record_count,
                    snap.size_bytes,
                    snap.description
                );
            }
            println!("  Total size: {} bytes", snapshots.total_size());
        }
        "restore" => {
            let version = match args.get(1).map(|s| s.as_str()) {
                Some("latest") | None => snapshots.latest_version(),
                Some(raw) => raw.parse::<u64>().ok(),
            };
            let Some(version) = version else {
                eprintln!("Usage: cellline snapshot restore [<version>|latest]");
                return;
            };
            let records = match snapshots.load_records(version) {
                Ok(records) => records,
                Err(e) => {
                    eprintln!("  Restore failed: {}", e);
                    return;
                }
            };
            let mut store = load_store(config);
            match store.replace_all(records) {
                Ok(()) => println!(
                    "  Restored v{} -> {} ({} cultures)",
                    version,
                    config.data_file.display(),
                    store.len()
                ),
                Err(e) => eprintln!("  Restore failed: {}", e),
            }
        }
        "verify" => {
            let results = snapshots.verify_all();
            if results.is_empty() {
                println!("\n  No snapshots to verify.");
                return;
            }
            println!("\n  Verification results:");
            for (ver, ok) in &results {
                println!("  v{}: {}", ver, if *ok { "OK" } else { "CORRUPTED" });
            }
            let all_ok = results.iter().all(|(_, ok)| *ok);
            println!(
                "  Overall: {}",
                if all_ok { "All snapshots intact" } else { "Some snapshots corrupted!" }
            );
        }
        other => {
            eprintln!("Unknown snapshot subcommand: {}", other);
            eprintln!("Usage: cellline snapshot [create [desc]|list|restore [<ver>|latest]|verify]");
        }
    }
}
