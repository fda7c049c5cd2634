//! Outgoing billing mail.

use chrono::{DateTime, Utc};

use crate::domain::billing::{format_money, Invoice, PaymentReceipt};
use crate::ports::{Attachment, MailStream, OutgoingEmail};

/// File name used for both the email attachment and the download.
pub fn invoice_filename(invoice_number: &str) -> String {
    format!("Invoice-{}.pdf", invoice_number)
}

/// New invoice mail on the billing stream, PDF attached.
pub fn invoice_email(
    to: &str,
    recipient_name: &str,
    company_name: &str,
    invoice: &Invoice,
    pdf: Vec<u8>,
) -> OutgoingEmail {
    let number = invoice.invoice_number.as_str();
    let html = format!(
        "<p>Hello {name},</p>\
         <p>Your invoice <strong>{number}</strong> for <strong>{amount}</strong> is attached.</p>\
         <p>Payment is due on {due}. You can pay with M-Pesa using the invoice number as the account number.</p>\
         <p>Thank you,<br>{company}</p>",
        name = escape_html(recipient_name),
        number = escape_html(number),
        amount = escape_html(&format_money(invoice.amount(), &invoice.currency)),
        due = invoice.due_date.format("%d %b %Y"),
        company = escape_html(company_name),
    );

    OutgoingEmail {
        stream: MailStream::Billing,
        to: to.to_string(),
        subject: format!("Invoice {}", number),
        html,
        attachments: vec![Attachment::pdf(invoice_filename(number), pdf)],
    }
}

/// Payment receipt mail on the accounts stream.
pub fn receipt_email(
    to: &str,
    recipient_name: &str,
    company_name: &str,
    invoice: &Invoice,
    receipt: &PaymentReceipt,
) -> OutgoingEmail {
    let number = invoice.invoice_number.as_str();
    let html = format!(
        "<p>Hello {name},</p>\
         <p>We have received your payment of <strong>{amount}</strong> for invoice <strong>{number}</strong>.</p>\
         <p>M-Pesa receipt: {receipt}<br>Paid on: {paid_at}</p>\
         <p>Thank you,<br>{company}</p>",
        name = escape_html(recipient_name),
        amount = escape_html(&format_money(invoice.amount(), &invoice.currency)),
        number = escape_html(number),
        receipt = escape_html(&receipt.receipt_number),
        paid_at = format_paid_at(receipt.paid_at),
        company = escape_html(company_name),
    );

    OutgoingEmail {
        stream: MailStream::Accounts,
        to: to.to_string(),
        subject: format!("Payment received for invoice {}", number),
        html,
        attachments: Vec::new(),
    }
}

fn format_paid_at(at: DateTime<Utc>) -> String {
    at.format("%d %b %Y %H:%M UTC").to_string()
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::billing::InvoiceNumber;
    use crate::domain::foundation::UserId;
    use chrono::{NaiveDate, TimeZone};
    use rust_decimal::Decimal;

    fn invoice() -> Invoice {
        Invoice::new(
            None,
            UserId::new(),
            InvoiceNumber::from_parts(2024, 7),
            Decimal::from(5000),
            "KES",
            NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 2, 6, 0, 0).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn invoice_email_attaches_pdf_on_billing_stream() {
        let email = invoice_email("a@b.test", "Jane", "Acme", &invoice(), vec![1, 2, 3]);
        assert_eq!(email.stream, MailStream::Billing);
        assert_eq!(email.subject, "Invoice INV-2024-0007");
        assert_eq!(email.attachments.len(), 1);
        assert_eq!(email.attachments[0].filename, "Invoice-INV-2024-0007.pdf");
        assert_eq!(email.attachments[0].content_type, "application/pdf");
        assert!(email.html.contains("KES 5,000.00"));
    }

    #[test]
    fn receipt_email_uses_accounts_stream() {
        let receipt = PaymentReceipt {
            receipt_number: "QAX123".to_string(),
            paid_at: Utc.with_ymd_and_hms(2024, 1, 3, 9, 15, 0).unwrap(),
        };
        let email = receipt_email("a@b.test", "Jane", "Acme", &invoice(), &receipt);
        assert_eq!(email.stream, MailStream::Accounts);
        assert!(email.html.contains("QAX123"));
        assert!(email.attachments.is_empty());
    }

    #[test]
    fn names_are_escaped() {
        let email = invoice_email("a@b.test", "<script>", "A&B", &invoice(), vec![]);
        assert!(email.html.contains("&lt;script&gt;"));
        assert!(email.html.contains("A&amp;B"));
    }
}
