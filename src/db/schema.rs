pub const SCHEMA: &str = r#"
PRAGMA foreign_keys = ON;

-- contemplations table
CREATE TABLE IF NOT EXISTS contemplations (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    question TEXT NOT NULL,
    active INTEGER NOT NULL DEFAULT 1,
    featured INTEGER NOT NULL DEFAULT 0,
    sort_order INTEGER NOT NULL DEFAULT 0,
    votes INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_contemplations_sort_order ON contemplations(sort_order);

-- answers table (sticky notes); orphaned notes keep their question text
CREATE TABLE IF NOT EXISTS answers (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    contemplation_id INTEGER REFERENCES contemplations(id) ON DELETE SET NULL,
    question TEXT NOT NULL,
    answer TEXT NOT NULL,
    author TEXT NOT NULL,
    color TEXT NOT NULL,
    position_x REAL NOT NULL,
    position_y REAL NOT NULL,
    rotation REAL NOT NULL,
    approved INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_answers_contemplation_id ON answers(contemplation_id);
CREATE INDEX IF NOT EXISTS idx_answers_approved ON answers(approved);

-- intentions table
CREATE TABLE IF NOT EXISTS intentions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    text TEXT NOT NULL,
    active INTEGER NOT NULL DEFAULT 1,
    sort_order INTEGER NOT NULL DEFAULT 0
);

-- quotes table
CREATE TABLE IF NOT EXISTS quotes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    text TEXT NOT NULL,
    author TEXT NOT NULL,
    source TEXT,
    active INTEGER NOT NULL DEFAULT 1
);

-- articles table
CREATE TABLE IF NOT EXISTS articles (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    slug TEXT NOT NULL UNIQUE,
    title TEXT NOT NULL,
    excerpt TEXT NOT NULL DEFAULT '',
    date TEXT NOT NULL,
    read_time TEXT NOT NULL DEFAULT '',
    tags TEXT NOT NULL DEFAULT '[]',
    featured INTEGER NOT NULL DEFAULT 0,
    epigraph TEXT,
    content_format TEXT NOT NULL DEFAULT 'markdown',
    content_body TEXT NOT NULL DEFAULT ''
);

CREATE INDEX IF NOT EXISTS idx_articles_date ON articles(date DESC);

-- projects table
CREATE TABLE IF NOT EXISTS projects (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    slug TEXT NOT NULL UNIQUE,
    title TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    tech TEXT NOT NULL DEFAULT '[]',
    year INTEGER NOT NULL,
    status TEXT NOT NULL DEFAULT 'Active',
    featured INTEGER NOT NULL DEFAULT 0,
    role TEXT,
    links TEXT,
    philosophy TEXT,
    sections TEXT,
    gallery TEXT
);

CREATE INDEX IF NOT EXISTS idx_projects_year ON projects(year DESC);
"#;
