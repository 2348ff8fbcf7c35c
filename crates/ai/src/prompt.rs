//! Prompt identifiers, their templates and the placeholder renderer.
//!
//! Templates use `{{path}}` placeholders resolved against the flow's JSON
//! input, where `path` is a dot-separated key path (`ticket.status`).

use std::fmt;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde_json::Value;

use crate::error::AiError;

static PLACEHOLDER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([a-zA-Z_][a-zA-Z0-9_]*(?:\.[a-zA-Z0-9_]+)*)\s*\}\}").expect("valid regex")
});

/// Every prompt the gateway knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptId {
    AskAssistant,
    SuggestTicketDetails,
    SuggestTicketTitle,
    SuggestTicketState,
    SuggestTechnician,
    DiagnoseConnection,
    AnalyzeDashboard,
}

impl PromptId {
    pub const ALL: &'static [PromptId] = &[
        PromptId::AskAssistant,
        PromptId::SuggestTicketDetails,
        PromptId::SuggestTicketTitle,
        PromptId::SuggestTicketState,
        PromptId::SuggestTechnician,
        PromptId::DiagnoseConnection,
        PromptId::AnalyzeDashboard,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PromptId::AskAssistant => "ask_assistant",
            PromptId::SuggestTicketDetails => "suggest_ticket_details",
            PromptId::SuggestTicketTitle => "suggest_ticket_title",
            PromptId::SuggestTicketState => "suggest_ticket_state",
            PromptId::SuggestTechnician => "suggest_technician",
            PromptId::DiagnoseConnection => "diagnose_connection",
            PromptId::AnalyzeDashboard => "analyze_dashboard",
        }
    }

    /// System instruction shared by the model call for this prompt.
    pub fn system_instruction(self) -> &'static str {
        match self {
            PromptId::AskAssistant => ASSISTANT_SYSTEM,
            PromptId::DiagnoseConnection => {
                "Eres un ingeniero de soporte experto en el backend de GemelliFix \
                 (API HTTP, PostgreSQL, autenticación por token). Respondes en español."
            }
            _ => {
                "Eres el asistente de operaciones de mantenimiento del colegio GemelliFix. \
                 Respondes en español y siempre con un único objeto JSON."
            }
        }
    }

    pub fn template(self) -> &'static str {
        match self {
            PromptId::AskAssistant => ASK_ASSISTANT,
            PromptId::SuggestTicketDetails => SUGGEST_TICKET_DETAILS,
            PromptId::SuggestTicketTitle => SUGGEST_TICKET_TITLE,
            PromptId::SuggestTicketState => SUGGEST_TICKET_STATE,
            PromptId::SuggestTechnician => SUGGEST_TECHNICIAN,
            PromptId::DiagnoseConnection => DIAGNOSE_CONNECTION,
            PromptId::AnalyzeDashboard => ANALYZE_DASHBOARD,
        }
    }

    /// Render this prompt's template against `input`.
    pub fn render(self, input: &Value) -> Result<String, AiError> {
        render(self.template(), input)
    }
}

impl fmt::Display for PromptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Replace every `{{path}}` in `template` with the value found at `path` in
/// `input`. A placeholder with no matching value is an error.
pub fn render(template: &str, input: &Value) -> Result<String, AiError> {
    let mut missing: Option<String> = None;
    let rendered = PLACEHOLDER_RE.replace_all(template, |caps: &Captures<'_>| {
        let path = &caps[1];
        match lookup(input, path) {
            Some(value) => format_value(value),
            None => {
                missing.get_or_insert_with(|| path.to_string());
                String::new()
            }
        }
    });
    match missing {
        Some(path) => Err(AiError::Template(format!("no value for placeholder '{path}'"))),
        None => Ok(rendered.into_owned()),
    }
}

fn lookup<'a>(input: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(input, |node, key| match node {
        Value::Object(map) => map.get(key),
        Value::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// Strings verbatim, scalars via `Display`, lists one entry per line.
fn format_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Array(items) if items.is_empty() => "(sin datos)".to_string(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Object(map) => {
                    let fields: Vec<String> = map
                        .iter()
                        .map(|(k, v)| format!("{k}: {}", format_value(v)))
                        .collect();
                    format!("- {}", fields.join(", "))
                }
                other => format!("- {}", format_value(other)),
            })
            .collect::<Vec<_>>()
            .join("\n"),
        other => other.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Templates
// ---------------------------------------------------------------------------

const ASSISTANT_SYSTEM: &str = "\
Eres Molly, la asistente de ayuda de GemelliFix, la plataforma de mantenimiento del colegio. \
Solo respondes preguntas sobre cómo usar la plataforma, en español, con tono amable y usando \
Markdown cuando ayude a la lectura.";

const ASK_ASSISTANT: &str = "\
Contexto de GemelliFix:
- Docentes, Coordinadores y Administrativos crean solicitudes (tickets) y siguen las suyas.
- Servicios Generales es el personal técnico: atiende los tickets asignados, registra avances y sube evidencia.
- El Administrador asigna, prioriza, aprueba y gestiona usuarios, zonas y categorías.
- SST consulta todos los tickets y el tablero en modo de solo lectura.
- Ciclo de un ticket: Abierto -> Asignado -> En Progreso -> Resuelto -> Cerrado. \
Al subir evidencia pasa a Requiere Aprobación; el solicitante o el administrador lo cierra \
o lo devuelve a Asignado.
- Las requisiciones de compra registran ítems que se autorizan y se reciben uno a uno.

Pregunta del usuario:
\"{{question}}\"

Devuelve un JSON con la forma {\"answer\": string}.";

const SUGGEST_TICKET_DETAILS: &str = "\
Analiza esta solicitud de mantenimiento y sugiere categoría y prioridad.

Título: {{title}}
Descripción: {{description}}

Categorías disponibles:
{{categories}}

Guía de prioridad:
- Urgente: riesgo para la seguridad o detiene la operación del colegio (fuga de gas, corte de energía, inundación).
- Alta: interrumpe actividades sin ser emergencia (aire acondicionado dañado en un salón lleno, sin internet en la biblioteca).
- Media: mantenimiento corriente (silla rota, luz intermitente, grifo que gotea).
- Baja: detalles menores o estéticos (rayón en la pared, puerta que chirría).

Devuelve un JSON {\"category\": string, \"priority\": \"Baja\"|\"Media\"|\"Alta\"|\"Urgente\", \
\"reasoning\": string}, donde category es exactamente una de las categorías disponibles y \
reasoning es una frase corta en español.";

const SUGGEST_TICKET_TITLE: &str = "\
Resume la siguiente descripción de un problema de mantenimiento en un título corto y \
estandarizado, en español y con mayúscula inicial en cada palabra importante \
(por ejemplo \"Falla en Proyector de Salón 203\" o \"Toma Eléctrica Defectuosa\").

Descripción:
\"{{description}}\"

Devuelve un JSON {\"title\": string}.";

const SUGGEST_TICKET_STATE: &str = "\
Revisa la situación de este ticket de mantenimiento.

Fecha actual: {{now}}
Estado: {{status}}
Fecha límite: {{due_date}}
Asignado a: {{assigned_to}}
Rol de quien consulta: {{role}}
Vencido: {{overdue}}
Siguiente estado sugerido por las reglas del sistema: {{suggested_status}}

Si el ticket está vencido, explica con tono directo cuánto lleva vencido y recomienda pasos \
concretos (contactar al técnico, reasignar o escalar). Si no está vencido, explica el estado \
actual y recomienda el siguiente estado sugerido.

Devuelve un JSON {\"analysis\": string, \"recommendation\": string}.";

const SUGGEST_TECHNICIAN: &str = "\
Sugiere la persona de Servicios Generales más adecuada para este ticket.

Título: {{title}}
Descripción: {{description}}
Categoría: {{category}}

Personal disponible (id, nombre, tickets abiertos asignados, carga en porcentaje):
{{technicians}}

Prefiere a quien tenga menor carga; ante cargas similares cualquiera sirve.

Devuelve un JSON {\"technician_id\": number, \"technician_name\": string, \
\"workload_percentage\": number, \"reason\": string}. technician_id debe ser uno de los ids listados.";

const DIAGNOSE_CONNECTION: &str = "\
Un usuario ejecutó una prueba de diagnóstico contra el backend y obtuvo este error:

Código: {{error_code}}
Mensaje: {{error_message}}

Identifica la causa más probable. Si el código indica permisos (403), revisa el rol del \
usuario; si indica autenticación (401), revisa el token y el inicio de sesión; si es de red \
o 5xx, revisa la configuración del servidor y la conexión.

Devuelve un JSON {\"analysis\": string, \"suggested_steps\": string}, con los pasos como \
lista en Markdown.";

const ANALYZE_DASHBOARD: &str = "\
Redacta un resumen ejecutivo en español, en Markdown, del estado del mantenimiento a partir \
de estos indicadores. Empieza por la visión general, destaca lo que va bien, señala \
concentraciones por zona o categoría y tendencias que requieran atención.

Tickets abiertos: {{open_tickets}}
Tickets vencidos: {{overdue_tickets}}
Cumplimiento de SLA: {{sla_compliance}}%
Tiempo medio de resolución: {{average_resolution_hours}} horas

Cumplimiento por prioridad:
{{compliance_by_priority}}

Tickets por zona:
{{tickets_by_zone}}

Principales solicitantes:
{{top_requesters}}

Categorías más frecuentes:
{{popular_categories}}

Tickets creados por mes:
{{tickets_by_month}}

Devuelve un JSON {\"summary\": string}.";
