use chrono::{Datelike, NaiveDate};

use crate::models::{AppointmentSummary, EmailMessage, NotificationEvent};

/// Brazilian short date, `dd/mm/yyyy`.
pub fn format_date_br(date: NaiveDate) -> String {
    format!("{:02}/{:02}/{}", date.day(), date.month(), date.year())
}

fn short_time(time: &str) -> &str {
    time.get(..5).unwrap_or(time)
}

fn appointment_details(summary: &AppointmentSummary) -> String {
    let mut details = format!(
        "Advogado: Dr. {}\nData: {}\nHorário: {}\n\nDescrição do caso:\n{}\n",
        summary.lawyer_name,
        format_date_br(summary.requested_date),
        short_time(&summary.requested_time),
        summary.description,
    );

    if let Some(notes) = summary.notes.as_deref().filter(|n| !n.trim().is_empty()) {
        details.push_str(&format!("\nObservações:\n{}\n", notes));
    }

    details
}

fn footer(firm_name: &str, contact: &str) -> String {
    format!(
        "\nPara reagendar ou cancelar sua consulta, entre em contato conosco: {}\n\
         Este é um email automático, por favor não responda.\n\n{}",
        contact, firm_name
    )
}

pub fn render(event: &NotificationEvent, firm_name: &str, from: &str) -> EmailMessage {
    let (subject, text) = match event {
        NotificationEvent::AppointmentConfirmed(summary) => (
            format!("Confirmação de Consulta - {}", firm_name),
            format!(
                "Olá {},\n\nTemos o prazer de informar que sua consulta foi confirmada com sucesso.\n\n{}\n\
                 Informações importantes:\n\
                 - Chegue com 10 minutos de antecedência\n\
                 - Traga documentos relevantes ao seu caso\n\
                 - Em caso de necessidade de reagendamento, avise com pelo menos 24h de antecedência\n{}",
                summary.user_name,
                appointment_details(summary),
                footer(firm_name, from),
            ),
        ),
        NotificationEvent::AppointmentCancelled(summary) => (
            format!("Cancelamento de Consulta - {}", firm_name),
            format!(
                "Olá {},\n\nInformamos que sua consulta foi cancelada.\n\n{}\n\
                 Caso deseje, você pode solicitar um novo agendamento a qualquer momento.\n{}",
                summary.user_name,
                appointment_details(summary),
                footer(firm_name, from),
            ),
        ),
        NotificationEvent::AppointmentCompleted(summary) => (
            format!("Conclusão de Consulta - {}", firm_name),
            format!(
                "Olá {},\n\nSua consulta foi concluída. Agradecemos a confiança.\n\n{}{}",
                summary.user_name,
                appointment_details(summary),
                footer(firm_name, from),
            ),
        ),
        NotificationEvent::EmailConfirmation { user_name, confirmation_url, .. } => (
            format!("Confirmação de Cadastro - {}", firm_name),
            format!(
                "Olá {},\n\nObrigado por se cadastrar. Confirme seu e-mail acessando o link abaixo:\n\n{}\n\n\
                 Se você não criou esta conta, ignore esta mensagem.\n\n{}",
                user_name, confirmation_url, firm_name
            ),
        ),
    };

    EmailMessage {
        from: from.to_string(),
        to: event.recipient().to_string(),
        subject,
        text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary() -> AppointmentSummary {
        AppointmentSummary {
            appointment_id: "appointment_1".to_string(),
            user_name: "Maria".to_string(),
            user_email: "maria@example.com".to_string(),
            lawyer_name: "João Silva".to_string(),
            requested_date: NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
            requested_time: "10:00:00".to_string(),
            description: "Consulta sobre contrato de aluguel".to_string(),
            notes: None,
        }
    }

    #[test]
    fn test_date_format() {
        let date = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();
        assert_eq!(format_date_br(date), "02/06/2025");
    }

    #[test]
    fn test_confirmation_template() {
        let event = NotificationEvent::AppointmentConfirmed(summary());
        let message = render(&event, "FGJN Advocacia", "contato@fgjn.adv.br");

        assert_eq!(message.to, "maria@example.com");
        assert_eq!(message.subject, "Confirmação de Consulta - FGJN Advocacia");
        assert!(message.text.contains("10/03/2025"));
        assert!(message.text.contains("Horário: 10:00\n"));
        assert!(message.text.contains("Dr. João Silva"));
        assert!(!message.text.contains("Observações"));
    }

    #[test]
    fn test_cancellation_template_includes_notes() {
        let mut summary = summary();
        summary.notes = Some("Advogado indisponível".to_string());
        let event = NotificationEvent::AppointmentCancelled(summary);
        let message = render(&event, "FGJN Advocacia", "contato@fgjn.adv.br");

        assert!(message.subject.starts_with("Cancelamento"));
        assert!(message.text.contains("Advogado indisponível"));
    }

    #[test]
    fn test_email_confirmation_template() {
        let event = NotificationEvent::EmailConfirmation {
            user_name: "Pedro".to_string(),
            user_email: "pedro@example.com".to_string(),
            confirmation_url: "http://localhost:3000/confirm-email?token=abc".to_string(),
        };
        let message = render(&event, "FGJN Advocacia", "contato@fgjn.adv.br");

        assert_eq!(message.to, "pedro@example.com");
        assert!(message.text.contains("confirm-email?token=abc"));
    }
}
