//! Portal constants: endpoints, form templates, headers and selectors.
//!
//! Form fields and headers mirror what the portal's own web client sends.

use crate::models::{DocumentType, Subcategory};

/// Row cap of the portal grid; more rows than this means truncated results.
pub const MAX_ROWS: usize = 1000;

// ============================================================================
// LOGIN PAGE
// ============================================================================

pub const COOKIE_STATEMENT_SELECTOR: &str = "#truste-consent-track";
pub const COOKIE_STATEMENT_BUTTON_SELECTOR: &str = "#truste-consent-button";
pub const USERNAME_INPUT_SELECTOR: &str = "#usernameId_new";
pub const PASSWORD_INPUT_SELECTOR: &str = "#passwordId_new";
pub const WRONG_IDENTIFIERS_HEADER_SELECTOR: &str =
    "div[aria-label*='The username or password is incorrect']";
pub const CHANGE_PASSWORD_HEADER_SELECTOR: &str = "div[aria-label*='Your password has expired']";
pub const SESSION_ALREADY_ACTIVE_SELECTOR: &str =
    "div[aria-label*='There is already an active SAP Fieldglass session running']";

// ============================================================================
// LISTING
// ============================================================================

pub const CURRENT_LINK_SELECTOR: &str = "#listViewWrapper";
pub const PAST_LINK_SELECTOR: &str = "#archivePastWrapper";

/// Listing endpoint (path and query) relative to the portal root.
pub fn listing_path(document_type: DocumentType, subcategory: Subcategory) -> &'static str {
    match (document_type, subcategory) {
        (DocumentType::Invoice, Subcategory::Current) => "invoice_list.do?moduleId=180&cf=1",
        (DocumentType::Invoice, Subcategory::Archived) => "past_invoice_list.do?moduleId=180&cf=1",
        (DocumentType::CreditMemo, Subcategory::Current) => "crdb_list.do?moduleId=412&cf=1",
        (DocumentType::CreditMemo, Subcategory::Archived) => "past_crdb_list.do?moduleId=412&cf=1",
    }
}

const CURR_INVOICE_BODY: &[(&str, &str)] = &[
    ("invoice_supplier_list_visibility", "label.myAccount"),
    ("invoiceListTypeFilter", "1,2,0"),
    ("invoice_supplier_list_grouping", "none"),
    ("ttFilterButtonClicked", "true"),
    ("invoice_supplier_list_s", "last_submit_time"),
    ("invoice_supplier_list_st", "d"),
    ("lastFocus", "invoice_supplier_list_search"),
    ("invoice_supplier_list_status_sch", ""),
    ("invoice_supplier_list_invoice_ref_sch", ""),
    ("invoice_supplier_list_invoice_code_sch", ""),
    ("invoice_supplier_list_name_sch", ""),
    ("invoice_supplier_list_buyer_name_sch", ""),
    ("invoice_supplier_list_refresh", ""),
    ("ajaxCall", "true"),
];

const PAST_INVOICE_BODY: &[(&str, &str)] = &[
    ("past_invoice_supplier_list_visibility", "label.myAccount"),
    ("moduleId", "180"),
    ("invoiceListTypeFilter", "1,2,0"),
    ("past_invoice_supplier_list_grouping", "none"),
    ("ttFilterButtonClicked", "true"),
    ("lastFocus", "past_invoice_supplier_list_search"),
    ("past_invoice_supplier_list_status_sch", ""),
    ("past_invoice_supplier_list_invoice_ref_sch", ""),
    ("past_invoice_supplier_list_invoice_code_sch", ""),
    ("past_invoice_supplier_list_name_sch", ""),
    ("past_invoice_supplier_list_cons_invoice_ref_sch", ""),
    ("past_invoice_supplier_list_buyer_name_sch", ""),
    ("past_invoice_supplier_list_refresh", ""),
    ("ajaxCall", "true"),
];

const CURR_CREDIT_MEMO_BODY: &[(&str, &str)] = &[
    ("crdb_supplier_list_visibility", "label.all"),
    ("crdb_supplier_list_grouping", "none"),
    ("ttFilterButtonClicked", "true"),
    ("lastFocus", "crdb_supplier_list_search"),
    ("crdb_supplier_list_status_sch", ""),
    ("crdb_supplier_list_crdb_ref_sch", ""),
    ("crdb_supplier_list_code_sch", ""),
    ("crdb_supplier_list_name_sch", ""),
    ("crdb_supplier_list_buyer_name_sch", ""),
    ("crdb_supplier_list_refresh", ""),
    ("ajaxCall", "true"),
];

const PAST_CREDIT_MEMO_BODY: &[(&str, &str)] = &[
    ("past_crdb_supplier_list_visibility", "label.all"),
    ("moduleId", "412"),
    ("past_crdb_supplier_list_grouping", "none"),
    ("ttFilterButtonClicked", "true"),
    ("past_crdb_supplier_list_s", "code"),
    ("past_crdb_supplier_list_st", "a"),
    ("lastFocus", "filterStartDate"),
    ("past_crdb_supplier_list_status_sch", ""),
    ("past_crdb_supplier_list_crdb_ref_sch", ""),
    ("past_crdb_supplier_list_code_sch", ""),
    ("past_crdb_supplier_list_name_sch", ""),
    ("past_crdb_supplier_list_buyer_name_sch", ""),
    ("past_crdb_supplier_list_refresh", ""),
    ("ajaxCall", "true"),
];

/// Fixed form fields of a listing request, before dates, paging and tokens.
pub fn listing_body_template(
    document_type: DocumentType,
    subcategory: Subcategory,
) -> &'static [(&'static str, &'static str)] {
    match (document_type, subcategory) {
        (DocumentType::Invoice, Subcategory::Current) => CURR_INVOICE_BODY,
        (DocumentType::Invoice, Subcategory::Archived) => PAST_INVOICE_BODY,
        (DocumentType::CreditMemo, Subcategory::Current) => CURR_CREDIT_MEMO_BODY,
        (DocumentType::CreditMemo, Subcategory::Archived) => PAST_CREDIT_MEMO_BODY,
    }
}

const SEC_CH_UA_CHROME_127: &str =
    "\"Not)A;Brand\";v=\"99\", \"Google Chrome\";v=\"127\", \"Chromium\";v=\"127\"";
const SEC_CH_UA_CHROME_125: &str =
    "\"Google Chrome\";v=\"125\", \"Chromium\";v=\"125\", \"Not.A/Brand\";v=\"24\"";

/// Fixed headers of a listing request; `cookie` and `Referer` are added per request.
pub fn listing_headers(
    document_type: DocumentType,
    subcategory: Subcategory,
) -> [(&'static str, &'static str); 12] {
    let sec_ch_ua = match (document_type, subcategory) {
        (DocumentType::Invoice, Subcategory::Archived) => SEC_CH_UA_CHROME_125,
        _ => SEC_CH_UA_CHROME_127,
    };
    [
        ("accept", "*/*"),
        ("accept-language", "en-US,en;q=0.9"),
        ("content-type", "application/x-www-form-urlencoded; charset=UTF-8"),
        ("sec-ch-ua", sec_ch_ua),
        ("sec-ch-ua-mobile", "?0"),
        ("sec-ch-ua-platform", "\"macOS\""),
        ("sec-fetch-dest", "empty"),
        ("sec-fetch-mode", "cors"),
        ("sec-fetch-site", "same-origin"),
        ("x-requested-with", "XMLHttpRequest"),
        ("x-tabsessionid", "tid1723309423028"),
        ("Referrer-Policy", "strict-origin-when-cross-origin"),
    ]
}

// ============================================================================
// DETAIL PAGE
// ============================================================================

pub const FETCH_DETAIL_HEADERS: [(&str, &str); 11] = [
    (
        "accept",
        "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8,application/signed-exchange;v=b3;q=0.7",
    ),
    ("accept-language", "en-US,en;q=0.9"),
    ("sec-ch-ua", SEC_CH_UA_CHROME_125),
    ("sec-ch-ua-mobile", "?0"),
    ("sec-ch-ua-platform", "\"macOS\""),
    ("sec-fetch-dest", "document"),
    ("sec-fetch-mode", "navigate"),
    ("sec-fetch-site", "same-origin"),
    ("sec-fetch-user", "?1"),
    ("upgrade-insecure-requests", "1"),
    ("Referrer-Policy", "strict-origin-when-cross-origin"),
];

pub const DOCUMENT_NUMBER_LABELS: &[&str] = &["Invoice Code", "Credit Memo Code", "Code"];
pub const PO_NUMBER_LABELS: &[&str] = &["PO Number", "Purchase Order"];
pub const DUE_DATE_LABELS: &[&str] = &["Due Date", "Payment Due Date"];
pub const TOTAL_LABELS: &[&str] = &["Total", "Invoice Total", "Total Amount"];

pub const HEADER_REGION_SELECTOR: &str = ".fd-page-header, .pageHeader, h1, h2";
pub const LABEL_CELL_SELECTOR: &str = "th, td, dt, dd, label, span, div";

/// Call that initializes the detail page header badge with its JSON summary.
pub const HEADER_INFO_INITIALIZER: &str = "FGHeaderInfo.init";

pub const STATUS_KEY: &str = "Status";
pub const SUBMIT_DATE_KEY: &str = "Submit Date";
pub const BUYER_KEY: &str = "Buyer";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_template_disables_grouping_and_is_an_ajax_call() {
        for document_type in [DocumentType::Invoice, DocumentType::CreditMemo] {
            for subcategory in [Subcategory::Current, Subcategory::Archived] {
                let body = listing_body_template(document_type, subcategory);
                assert!(body.contains(&("ajaxCall", "true")));
                assert!(body.iter().any(|(k, v)| k.ends_with("_grouping") && *v == "none"));
                assert!(!body.iter().any(|(k, _)| *k == "sgjy" || *k == "fgGridPager"));
            }
        }
    }

    #[test]
    fn archived_endpoints_are_past_lists() {
        assert!(listing_path(DocumentType::Invoice, Subcategory::Archived).starts_with("past_invoice_list.do"));
        assert!(listing_path(DocumentType::CreditMemo, Subcategory::Archived).starts_with("past_crdb_list.do"));
        assert!(!listing_path(DocumentType::CreditMemo, Subcategory::Current).starts_with("past_"));
    }
}
