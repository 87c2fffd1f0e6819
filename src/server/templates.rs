//! HTML for the assistant page.

use crate::config::Settings;
use crate::extract::SUPPORTED_EXTENSIONS;
use crate::server::SESSION_HEADER;
use crate::utils::{format_size, html_escape};

const STYLE: &str = r#"
body { font-family: system-ui, sans-serif; margin: 0; display: flex; min-height: 100vh; color: #1f2933; }
aside { width: 300px; padding: 1rem; background: #f5f7fa; border-right: 1px solid #d9e2ec; }
main { flex: 1; display: flex; flex-direction: column; padding: 1rem; }
#messages { flex: 1; overflow-y: auto; }
.msg { margin: .5rem 0; padding: .6rem .8rem; border-radius: 6px; white-space: pre-wrap; }
.msg.user { background: #e3f2fd; align-self: flex-end; }
.msg.assistant { background: #f0f4f8; }
form { display: flex; gap: .5rem; }
textarea { flex: 1; min-height: 3rem; }
ul { padding-left: 1rem; }
.muted { color: #7b8794; font-size: .85rem; }
table { border-collapse: collapse; font-size: .8rem; }
td { border-top: 1px solid #d9e2ec; padding: .25rem; vertical-align: top; }
"#;

const SCRIPT: &str = r#"
const HEADER = document.body.dataset.sessionHeader;
let session = localStorage.getItem('lexassist-session');

async function api(method, path, body, isForm) {
  const headers = {};
  if (session) headers[HEADER] = session;
  if (body && !isForm) headers['content-type'] = 'application/json';
  const res = await fetch(path, { method, headers, body: isForm ? body : (body ? JSON.stringify(body) : undefined) });
  const sid = res.headers.get(HEADER);
  if (sid) { session = sid; localStorage.setItem('lexassist-session', sid); }
  const data = await res.json().catch(() => ({}));
  return { ok: res.ok, data };
}

function el(tag, cls, text) {
  const e = document.createElement(tag);
  if (cls) e.className = cls;
  if (text !== undefined) e.textContent = text;
  return e;
}

function renderMessages(messages) {
  const box = document.getElementById('messages');
  box.replaceChildren(...messages.map(m => el('div', 'msg ' + m.role, m.content)));
  box.scrollTop = box.scrollHeight;
}

function renderFiles(files) {
  const list = document.getElementById('files');
  list.replaceChildren(...files.map(f => {
    const li = el('li', null, f.filename + ' ');
    const btn = el('button', null, '×');
    btn.onclick = async () => { await api('DELETE', '/api/assistant/files/' + encodeURIComponent(f.file_id)); refresh(); };
    li.appendChild(btn);
    return li;
  }));
}

function renderBills(bills) {
  const table = document.getElementById('bills');
  table.replaceChildren(...bills.map(b => {
    const tr = el('tr');
    tr.appendChild(el('td', null, b['Número']));
    const td = el('td');
    if (b['Enlace'] && b['Enlace'] !== 'N/A') {
      const a = el('a', null, b['Título']); a.href = b['Enlace']; a.target = '_blank'; td.appendChild(a);
    } else { td.textContent = b['Título']; }
    tr.appendChild(td);
    tr.appendChild(el('td', null, b['Estado']));
    return tr;
  }));
}

async function refresh() {
  const files = await api('GET', '/api/assistant/files'); if (files.ok) renderFiles(files.data);
  const msgs = await api('GET', '/api/assistant/messages'); if (msgs.ok) renderMessages(msgs.data);
  const bills = await api('GET', '/api/bills'); if (bills.ok) renderBills(bills.data);
}

document.getElementById('upload').onchange = async (ev) => {
  const status = document.getElementById('upload-status');
  for (const file of ev.target.files) {
    status.textContent = 'Procesando ' + file.name + '…';
    const form = new FormData(); form.append('file', file);
    const { data } = await api('POST', '/api/assistant/upload', form, true);
    status.textContent = data.status === 'success' ? '' : (data.message || 'Error');
  }
  ev.target.value = '';
  refresh();
};

document.getElementById('chat').onsubmit = async (ev) => {
  ev.preventDefault();
  const input = document.getElementById('prompt');
  const prompt = input.value.trim();
  if (!prompt) return;
  input.value = '';
  const button = ev.target.querySelector('button');
  button.disabled = true;
  const { ok, data } = await api('POST', '/api/assistant/chat', { prompt });
  button.disabled = false;
  if (ok) renderMessages(data.messages); else alert(data.error || 'Error');
};

document.getElementById('scrape').onclick = async (ev) => {
  ev.target.disabled = true;
  const { ok, data } = await api('POST', '/api/bills/scrape');
  ev.target.disabled = false;
  if (ok) renderBills(data);
};

refresh();
"#;

/// The single-page assistant UI.
pub fn assistant_page(settings: &Settings) -> String {
    let accept = SUPPORTED_EXTENSIONS
        .iter()
        .map(|ext| format!(".{}", ext))
        .collect::<Vec<_>>()
        .join(",");
    let limits = format!(
        "Hasta {} archivos ({}), máximo {} cada uno.",
        settings.server.max_files_per_session,
        SUPPORTED_EXTENSIONS.join(", "),
        format_size(settings.server.max_upload_bytes as u64)
    );

    format!(
        r#"<!DOCTYPE html>
<html lang="es">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Asistente constitucional</title>
<style>{style}</style>
</head>
<body data-session-header="{header}">
<aside>
  <h2>Documentos</h2>
  <input type="file" id="upload" accept="{accept}" multiple>
  <p class="muted">{limits}</p>
  <p id="upload-status" class="muted"></p>
  <ul id="files"></ul>
  <h2>Proyectos de ley</h2>
  <button id="scrape">Consultar recientes</button>
  <table id="bills"></table>
</aside>
<main>
  <h1>Asistente de derecho constitucional colombiano</h1>
  <div id="messages"></div>
  <form id="chat">
    <textarea id="prompt" placeholder="Escribe tu consulta…"></textarea>
    <button type="submit">Enviar</button>
  </form>
</main>
<script>{script}</script>
</body>
</html>"#,
        style = STYLE,
        header = html_escape(SESSION_HEADER),
        accept = html_escape(&accept),
        limits = html_escape(&limits),
        script = SCRIPT,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_mentions_limits() {
        let page = assistant_page(&Settings::default());
        assert!(page.contains("accept=\".pdf,.txt,.docx\""));
        assert!(page.contains("Hasta 3 archivos"));
        assert!(page.contains("25.0 MiB"));
    }
}
