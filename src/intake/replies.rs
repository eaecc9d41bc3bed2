//! Fixed Portuguese reply texts that are not question prompts.

use crate::normalize::Vocabulary;

pub(crate) const DECLINED: &str = "Entendo. Informamos que essa conversa é muito importante para \
     sua saúde. Aguardamos seu retorno.";

pub(crate) const CANCELLED: &str = "Conversa interrompida. Se precisar reiniciar, use /start.";

pub(crate) const NOTHING_TO_CANCEL: &str =
    "Não há nenhuma conversa em andamento. Envie /start para começar.";

pub(crate) const RESUMED: &str = "Vamos continuar de onde paramos.";

pub(crate) const NOT_YES_NO: &str = "Desculpe, não entendi. Por favor, responda SIM ou NÃO.";

pub(crate) const EMPTY_ANSWER: &str = "Não recebi nenhuma resposta.";

/// Re-prompt preface for an enumeration answer that could not be classified.
pub(crate) fn clarify(vocabulary: &Vocabulary, ambiguous: bool) -> String {
    let lead = if ambiguous {
        "Escolha apenas uma das opções abaixo."
    } else {
        "Não consegui identificar sua resposta. Você pode responder com o número ou com o nome \
         da opção, por exemplo:"
    };
    format!("{lead}\n{}", vocabulary.option_lines())
}

pub(crate) fn completed(recommendation: &str) -> String {
    format!("Pronto! Terminamos.\n\n{recommendation}\n\nMuito obrigada por sua participação!")
}
