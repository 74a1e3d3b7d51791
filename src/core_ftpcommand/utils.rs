use chrono::{DateTime, Datelike, Local, Utc};
use std::time::SystemTime;

use super::context::CommandContext;
use crate::core_proto::Reply;
use crate::core_vfs::{resolve_virtual, DirEntry, Metadata};

/// Resolves a client-supplied path argument against the session's working
/// directory. Escape attempts come back as the 550 reply the caller sends.
pub async fn resolve_path(ctx: &CommandContext, arg: &str) -> Result<String, Reply> {
    let session = ctx.session.lock().await;
    resolve_virtual(&session.cwd, arg.trim())
        .map_err(|_| Reply::new(550, "Path is outside of the allowed area."))
}

/// `ls -l` style line for LIST output.
pub fn format_list_line(entry: &DirEntry) -> String {
    let md = &entry.metadata;
    let kind = if md.is_dir { 'd' } else { '-' };
    let perms = match md.mode {
        Some(mode) => format_permissions(mode),
        None => String::from("rwxr-xr-x"),
    };
    let date = format_list_date(md.modified);
    format!(
        "{}{} 1 ftp ftp {:>12} {} {}",
        kind, perms, md.size, date, entry.name
    )
}

fn format_permissions(mode: u32) -> String {
    let mut out = String::with_capacity(9);
    for shift in [6u32, 3, 0] {
        let bits = (mode >> shift) & 0o7;
        out.push(if bits & 0o4 != 0 { 'r' } else { '-' });
        out.push(if bits & 0o2 != 0 { 'w' } else { '-' });
        out.push(if bits & 0o1 != 0 { 'x' } else { '-' });
    }
    out
}

/// Recent files show hour and minute, older ones the year, like ls does.
fn format_list_date(modified: Option<SystemTime>) -> String {
    let when: DateTime<Local> = match modified {
        Some(t) => t.into(),
        None => return String::from("Jan  1  1970"),
    };
    let now = Local::now();
    if when.year() == now.year() {
        when.format("%b %e %H:%M").to_string()
    } else {
        when.format("%b %e  %Y").to_string()
    }
}

/// RFC 3659 time-val: YYYYMMDDHHMMSS in UTC.
pub fn format_time_val(modified: Option<SystemTime>) -> String {
    let when: DateTime<Utc> = match modified {
        Some(t) => t.into(),
        None => return String::from("19700101000000"),
    };
    when.format("%Y%m%d%H%M%S").to_string()
}

/// MLSx fact string (without the name), e.g.
/// `type=file;size=42;modify=20240101120000;`.
pub fn format_mlsx_facts(md: &Metadata) -> String {
    let kind = if md.is_dir { "dir" } else { "file" };
    let mut facts = format!("type={};modify={};", kind, format_time_val(md.modified));
    if !md.is_dir {
        facts.push_str(&format!("size={};", md.size));
    }
    facts
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, UNIX_EPOCH};

    fn file_entry(name: &str, size: u64) -> DirEntry {
        DirEntry {
            name: name.to_string(),
            metadata: Metadata {
                is_dir: false,
                size,
                modified: Some(UNIX_EPOCH + Duration::from_secs(1_700_000_000)),
                mode: Some(0o644),
            },
        }
    }

    #[test]
    fn list_line_shape() {
        let line = format_list_line(&file_entry("notes.txt", 1234));
        assert!(line.starts_with("-rw-r--r-- 1 ftp ftp"));
        assert!(line.ends_with("notes.txt"));
        assert!(line.contains("1234"));
    }

    #[test]
    fn permission_bits_render() {
        assert_eq!(format_permissions(0o755), "rwxr-xr-x");
        assert_eq!(format_permissions(0o600), "rw-------");
    }

    #[test]
    fn time_val_is_utc_compact() {
        let t = UNIX_EPOCH + Duration::from_secs(0);
        assert_eq!(format_time_val(Some(t)), "19700101000000");
    }

    #[test]
    fn mlsx_facts_for_file_and_dir() {
        let entry = file_entry("x", 42);
        let facts = format_mlsx_facts(&entry.metadata);
        assert!(facts.starts_with("type=file;"));
        assert!(facts.contains("size=42;"));

        let dir_md = Metadata {
            is_dir: true,
            size: 0,
            modified: None,
            mode: None,
        };
        let facts = format_mlsx_facts(&dir_md);
        assert!(facts.starts_with("type=dir;"));
        assert!(!facts.contains("size="));
    }
}
