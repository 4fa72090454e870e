//! Shared helpers for integration tests: synthetic roster rows, in-memory
//! zip archives, a wiremock portal, and a test configuration pointed at it.

#![allow(dead_code)]

use std::io::Write;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use memberroster::config::{AppConfig, HttpConfig, PortalConfig, ReferenceConfig};

/// Combined roster filename matching the configured prefix.
pub const COMBINED_FILENAME: &str = "Premier_HISCI_Roster_W_HIN_Combined_20240105.txt";

/// Raw column indices that survive pruning and carry classification data.
const RELATIONSHIP_RAW_COLUMN: usize = 16;
const TOP_PARENT_RAW_COLUMN: usize = 19;
const STATUS_RAW_COLUMN: usize = 21;

/// Build a 26-column tab-separated data row with the classification fields
/// set at their raw offsets. Remaining columns hold positional filler.
pub fn roster_row(gpo_id: &str, relationship: &str, top_parent_id: &str, status: &str) -> String {
    let mut fields: Vec<String> = (0..26).map(|i| format!("f{i}")).collect();
    fields[0] = gpo_id.to_string();
    fields[RELATIONSHIP_RAW_COLUMN] = relationship.to_string();
    fields[TOP_PARENT_RAW_COLUMN] = top_parent_id.to_string();
    fields[STATUS_RAW_COLUMN] = status.to_string();
    fields.join("\t")
}

/// Build the 26-column header row. The first field is the header marker; the
/// rest are positional labels so pruning results are easy to assert on.
pub fn header_row() -> String {
    let mut fields: Vec<String> = (0..26).map(|i| format!("h{i}")).collect();
    fields[0] = "GPO ID".to_string();
    fields.join("\t")
}

/// Build a zip archive in memory from (filename, contents) pairs.
pub fn build_archive(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = ZipWriter::new(std::io::Cursor::new(Vec::new()));
    for (name, contents) in entries {
        writer
            .start_file(name.to_string(), SimpleFileOptions::default())
            .unwrap();
        writer.write_all(contents.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// Stand up a mock portal: an entry page with a login form, a login endpoint
/// returning either a roster listing or a bare page (rejected credentials),
/// and the archive download. The listing carries two roster links so the
/// first-in-document-order tie-break is exercised.
pub async fn mock_portal(archive: Vec<u8>, list_links: bool) -> MockServer {
    let server = MockServer::start().await;

    let login_page = r#"<html><body>
        <form class="login-form" action="/login" method="post">
            <input type="hidden" name="csrf" value="token123"/>
            <input type="text" name="username"/>
            <input type="password" name="password"/>
        </form>
    </body></html>"#;
    Mock::given(method("GET"))
        .and(path("/portal"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(login_page)
                .insert_header("content-type", "text/html; charset=utf-8"),
        )
        .mount(&server)
        .await;

    let listing = if list_links {
        concat!(
            "<html><body>",
            r#"<a href="/downloads/roster_new.zip">Premier_HISCI_Roster_W_HIN_20240105.zip</a>"#,
            r#"<a href="/downloads/roster_old.zip">Premier_HISCI_Roster_W_HIN_20231201.zip</a>"#,
            "</body></html>"
        )
    } else {
        "<html><body><p>Welcome back</p></body></html>"
    };
    Mock::given(method("POST"))
        .and(path("/login"))
        .and(body_string_contains("csrf=token123"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(listing)
                .insert_header("content-type", "text/html; charset=utf-8"),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/downloads/roster_new.zip"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(archive)
                .insert_header("content-type", "application/zip"),
        )
        .mount(&server)
        .await;

    server
}

/// Configuration pointed at the mock portal, with small reference sets:
/// CA2043 is in both groups, 635796 and OH2004 are SPG-only.
pub fn test_config(server_uri: &str) -> AppConfig {
    AppConfig {
        portal: PortalConfig {
            url: format!("{server_uri}/portal"),
            login_form_class: "login-form".to_string(),
            link_prefix: "Premier_HISCI_Roster_W_HIN_".to_string(),
            combined_file_prefix: "Premier_HISCI_Roster_W_HIN_Combined_".to_string(),
        },
        http: HttpConfig {
            timeout_secs: 10,
            user_agent: "memberroster-tests".to_string(),
        },
        reference: ReferenceConfig {
            spg_ids: vec![
                "635796".to_string(),
                "OH2004".to_string(),
                "CA2043".to_string(),
            ],
            lidn_ids: vec!["CA2043".to_string(), "IL5043".to_string()],
        },
    }
}
