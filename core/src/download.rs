//! Filled-in PDF downloads for a submission.
//!
//! These endpoints answer with the PDF itself rather than a JSON envelope,
//! so the body is returned untouched and the output type is ignored.

use std::collections::BTreeMap;

use tracing::warn;

use crate::client::{http_error, JotformClient};
use crate::error::ApiError;
use crate::http::HttpMethod;
use crate::params::RequestParams;

impl JotformClient {
    /// PDF of a submission laid out on the form's own PDF template, for
    /// forms that were created in Jotform from a PDF.
    ///
    /// Fails with `ApiError::NotImplemented` when the form has no such
    /// template; `download_simple_pdf_submission` works for every form.
    /// The server answers HTTP 400 for that case, and every other 400 from
    /// this endpoint (an unknown submission ID, for one) is reported as
    /// `NotImplemented` too.
    pub fn download_rich_pdf_submission(
        &self,
        form_id: i64,
        submission_id: i64,
    ) -> Result<Vec<u8>, ApiError> {
        let query = BTreeMap::from([("submissionID".to_string(), submission_id.to_string())]);
        self.download(
            &format!("pdf-converter/{form_id}/fill-pdf"),
            query,
            Some(form_id),
        )
    }

    /// PDF with the form's field names and values, without special
    /// formatting. `report_id` selects a specific PDF report design;
    /// `None` uses the server default.
    pub fn download_simple_pdf_submission(
        &self,
        form_id: i64,
        submission_id: i64,
        report_id: Option<i64>,
    ) -> Result<Vec<u8>, ApiError> {
        let mut query = BTreeMap::from([
            ("formid".to_string(), form_id.to_string()),
            ("submissionid".to_string(), submission_id.to_string()),
            ("download".to_string(), "1".to_string()),
        ]);
        if let Some(report_id) = report_id {
            query.insert("reportid".to_string(), report_id.to_string());
        }
        self.download("generatePDF", query, None)
    }

    /// `template_form` is set for endpoints where HTTP 400 means the form
    /// has no PDF template.
    fn download(
        &self,
        resource: &str,
        query: BTreeMap<String, String>,
        template_form: Option<i64>,
    ) -> Result<Vec<u8>, ApiError> {
        let request = self.compose(
            HttpMethod::Get,
            self.raw_url(resource),
            RequestParams::Fields(query),
        )?;
        let response = self.send(&request)?;

        if let (400, Some(form_id)) = (response.status, template_form) {
            warn!(form_id, "form has no associated PDF template");
            return Err(ApiError::NotImplemented { form_id });
        }
        if !response.is_success() {
            return Err(http_error(&request, &response));
        }
        Ok(response.body)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use crate::config::{ClientConfig, OutputType};
    use crate::http::{HttpRequest, HttpResponse, TransportError};

    use super::*;

    const PDF: &[u8] = b"%PDF-1.7 pretend this is a PDF";

    fn recording_client(
        status: u16,
        body: &'static [u8],
    ) -> (JotformClient, Arc<Mutex<Vec<HttpRequest>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&seen);
        let transport = move |req: &HttpRequest| -> Result<HttpResponse, TransportError> {
            log.lock().unwrap().push(req.clone());
            Ok(HttpResponse::new(status, body))
        };
        let client = JotformClient::with_transport(ClientConfig::new("api-key"), transport).unwrap();
        (client, seen)
    }

    #[test]
    fn rich_pdf_targets_converter_endpoint() {
        let (client, seen) = recording_client(200, PDF);
        let pdf = client.download_rich_pdf_submission(123, 456).unwrap();
        assert_eq!(pdf, PDF);
        let req = &seen.lock().unwrap()[0];
        assert_eq!(
            req.url,
            "https://api.jotform.com/v1/pdf-converter/123/fill-pdf?submissionID=456"
        );
        assert_eq!(req.header("apiKey"), Some("api-key"));
    }

    #[test]
    fn rich_pdf_without_template_is_not_implemented() {
        let body = br#"{"responseCode":400,"message":"draw-pdf-answers Request Failed","content":"","duration":"98.08ms"}"#;
        let (client, _) = recording_client(400, body);
        let err = client.download_rich_pdf_submission(123, 456).unwrap_err();
        assert!(err.is_not_implemented());
    }

    #[test]
    fn rich_pdf_any_400_is_not_implemented() {
        let body = br#"{"responseCode":400,"message":"Submission ID is invalid","content":""}"#;
        let (client, _) = recording_client(400, body);
        let err = client.download_rich_pdf_submission(1, 999).unwrap_err();
        assert!(matches!(err, ApiError::NotImplemented { form_id: 1 }));
    }

    #[test]
    fn rich_pdf_permission_denied_is_http_error() {
        let body = br#"{"responseCode":401,"message":"You're not authorized to use (\/pdf-converter-id-fill-pdf) ","content":""}"#;
        let (client, _) = recording_client(401, body);
        let err = client.download_rich_pdf_submission(123, 456).unwrap_err();
        assert!(matches!(err, ApiError::Http { status: 401, .. }));
        assert!(err.to_string().contains("401"));
        assert!(err.to_string().contains("GET https://api.jotform.com/v1/pdf-converter/123/fill-pdf"));
    }

    #[test]
    fn simple_pdf_with_report() {
        let (client, seen) = recording_client(200, PDF);
        let pdf = client.download_simple_pdf_submission(123, 456, Some(789)).unwrap();
        assert_eq!(pdf, PDF);
        assert_eq!(
            seen.lock().unwrap()[0].url,
            "https://api.jotform.com/v1/generatePDF?download=1&formid=123&reportid=789&submissionid=456"
        );
    }

    #[test]
    fn simple_pdf_without_report() {
        let (client, seen) = recording_client(200, PDF);
        client.download_simple_pdf_submission(123, 456, None).unwrap();
        assert_eq!(
            seen.lock().unwrap()[0].url,
            "https://api.jotform.com/v1/generatePDF?download=1&formid=123&submissionid=456"
        );
    }

    #[test]
    fn simple_pdf_400_is_plain_http_error() {
        let (client, _) = recording_client(400, b"bad request");
        let err = client.download_simple_pdf_submission(1, 2, None).unwrap_err();
        assert!(matches!(err, ApiError::Http { status: 400, .. }));
    }

    #[test]
    fn downloads_ignore_xml_output() {
        let (client, seen) = recording_client(200, PDF);
        let client = client.with_output_type(OutputType::Xml);
        let pdf = client.download_simple_pdf_submission(1, 2, None).unwrap();
        assert_eq!(pdf, PDF);
        assert!(!seen.lock().unwrap()[0].url.contains(".xml"));
    }
}
